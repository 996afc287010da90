//! Received header parsing.
//!
//! A Received value is a sequence of optional clauses (`from`, `by`, `via`,
//! `with`, `id`, `for`) followed by `;` and a date-time. MTAs disagree on
//! almost everything else, so each clause is extracted independently and
//! anything that does not fit degrades to an absent field.

use crate::classifier::TokenClassifier;
use crate::tokens::{Token, TokenKind, span, tokenize};
use crate::types::{ByClause, Endpoint, FromClause, Hop, Starttls};
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

const KEYWORDS: [&str; 6] = ["from", "by", "via", "with", "id", "for"];

static BRACKETED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]\s]*\]").unwrap());

static TLS_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bversion=([^\s,;()]+)[\s,;]+cipher=([^\s,;()]+)").unwrap()
});

static TRAILING_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^()]*\)\s*$").unwrap());

static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Za-z]{3}\s*,\s*)?\d{1,2}\s+[A-Za-z]{3}\s+\d{4}\s+\d{1,2}:\d{2}(?::\d{2})?\s+[+-]\d{4}$",
    )
    .unwrap()
});

/// Parse one Received header value into a hop.
///
/// `None` (no header) yields a hop with every field absent.
#[must_use]
pub fn parse_received(value: Option<&str>, classifier: &dyn TokenClassifier) -> Hop {
    let Some(value) = value else {
        return Hop::default();
    };

    let (clauses, date) = split_timestamp(value);
    let tokens = tokenize(clauses);

    Hop {
        from: from_clause(&tokens, classifier),
        by: by_clause(clauses, &tokens, classifier),
        for_address: for_clause(&tokens),
        starttls: starttls_annotation(&tokens),
        timestamp: date.and_then(parse_date_time),
        raw: Some(value.to_string()),
    }
}

/// Extract the `from` clause: HELO name plus the `(host [ip])` comment
#[must_use]
pub fn parse_from(value: Option<&str>, classifier: &dyn TokenClassifier) -> FromClause {
    value.map_or_else(FromClause::default, |value| {
        let (clauses, _) = split_timestamp(value);
        from_clause(&tokenize(clauses), classifier)
    })
}

/// Extract the `by` clause: recipient, free text, protocol and queue id
#[must_use]
pub fn parse_by(value: Option<&str>, classifier: &dyn TokenClassifier) -> ByClause {
    value.map_or_else(ByClause::default, |value| {
        let (clauses, _) = split_timestamp(value);
        by_clause(clauses, &tokenize(clauses), classifier)
    })
}

/// Extract the envelope recipient of the `for` clause
#[must_use]
pub fn parse_for(value: Option<&str>) -> Option<String> {
    let (clauses, _) = split_timestamp(value?);
    for_clause(&tokenize(clauses))
}

/// Find a `(version=X cipher=Y)` annotation
#[must_use]
pub fn parse_starttls(value: Option<&str>) -> Option<Starttls> {
    starttls_annotation(&tokenize(value?))
}

/// Parse the date-time after the final `;`
#[must_use]
pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    split_timestamp(value?).1.and_then(parse_date_time)
}

/// Split at the last top-level `;` into clause text and date text
fn split_timestamp(value: &str) -> (&str, Option<&str>) {
    tokenize(value)
        .iter()
        .rev()
        .find(|t| t.kind == TokenKind::Separator)
        .map_or((value, None), |sep| {
            (&value[..sep.start], Some(&value[sep.end..]))
        })
}

fn is_any_keyword(token: &Token<'_>) -> bool {
    KEYWORDS.iter().any(|k| token.is_keyword(k))
}

fn keyword_position(tokens: &[Token<'_>], keyword: &str) -> Option<usize> {
    tokens.iter().position(|t| t.is_keyword(keyword))
}

/// Word directly after `keyword`, unless it is itself a keyword
fn keyword_argument<'a>(tokens: &[Token<'a>], keyword: &str) -> Option<Token<'a>> {
    let pos = keyword_position(tokens, keyword)?;
    tokens
        .get(pos + 1)
        .filter(|t| t.is_word() && !is_any_keyword(t))
        .copied()
}

/// Tokens up to (not including) the next clause keyword
fn until_keyword<'t, 'a>(tokens: &'t [Token<'a>]) -> &'t [Token<'a>] {
    let end = tokens
        .iter()
        .position(is_any_keyword)
        .unwrap_or(tokens.len());
    &tokens[..end]
}

fn from_clause(tokens: &[Token<'_>], classifier: &dyn TokenClassifier) -> FromClause {
    let Some(pos) = keyword_position(tokens, "from") else {
        return FromClause::default();
    };

    let rest = &tokens[pos + 1..];
    let helo = rest.first().filter(|t| t.is_word() && !is_any_keyword(t));
    let after_helo = if helo.is_some() { &rest[1..] } else { rest };

    let mut clause = FromClause {
        helo: helo.map(|t| t.text.to_string()),
        ..FromClause::default()
    };

    if let Some(comment) = after_helo.first().filter(|t| t.kind == TokenKind::Comment) {
        let inner = comment.inner();

        clause.host = inner
            .split_whitespace()
            .next()
            .filter(|word| !word.starts_with('[') && !word.contains('='))
            .map(|word| classifier.classify(word));

        clause.ip = BRACKETED_LITERAL
            .find(inner)
            .and_then(|m| match classifier.classify(m.as_str()) {
                Endpoint::IpLiteral(ip) => Some(ip),
                Endpoint::Hostname(_) => None,
            });
    }

    clause
}

fn by_clause(source: &str, tokens: &[Token<'_>], classifier: &dyn TokenClassifier) -> ByClause {
    let Some(pos) = keyword_position(tokens, "by") else {
        return ByClause::default();
    };

    let rest = &tokens[pos + 1..];
    let recipient = rest.first().filter(|t| t.is_word() && !is_any_keyword(t));
    let after_recipient = if recipient.is_some() { &rest[1..] } else { rest };

    let free_text = until_keyword(after_recipient);
    let trailing = &after_recipient[free_text.len()..];

    let recipient_additional = match free_text {
        [] => None,
        // a lone word next to the recipient is not additional information
        [only] if only.is_word() => None,
        [only] if matches!(only.kind, TokenKind::Comment | TokenKind::Quoted) => {
            Some(only.inner())
        }
        run => span(source, run).map(str::trim),
    }
    .filter(|text| !text.is_empty())
    .map(str::to_string);

    let protocol_words: Vec<&str> = keyword_position(trailing, "with")
        .map(|with| until_keyword(&trailing[with + 1..]))
        .unwrap_or_default()
        .iter()
        .filter(|t| t.is_word())
        .map(|t| t.text)
        .collect();

    let protocol = match (recipient_additional.is_some(), protocol_words.as_slice()) {
        (_, []) => None,
        (true, [word]) => Some((*word).to_string()),
        (true, _) => None,
        (false, words) => Some(words.join(" ")),
    };

    ByClause {
        recipient: recipient.map(|t| classifier.classify(t.text)),
        recipient_additional,
        protocol,
        id: keyword_argument(trailing, "id").map(|t| t.text.to_string()),
    }
}

fn for_clause(tokens: &[Token<'_>]) -> Option<String> {
    keyword_argument(tokens, "for")
        .map(|t| t.text.trim_start_matches('<').trim_end_matches('>'))
        .filter(|address| !address.is_empty())
        .map(str::to_string)
}

fn starttls_annotation(tokens: &[Token<'_>]) -> Option<Starttls> {
    tokens
        .iter()
        .rev()
        .filter(|t| t.kind == TokenKind::Comment)
        .find_map(|t| TLS_ANNOTATION.captures(t.inner()))
        .map(|caps| Starttls {
            version: caps[1].to_string(),
            cipher: caps[2].to_string(),
        })
}

fn parse_date_time(text: &str) -> Option<DateTime<FixedOffset>> {
    let mut text = text.trim();
    while let Some(m) = TRAILING_COMMENT.find(text) {
        text = &text[..m.start()];
    }
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if !DATE_TIME.is_match(&text) {
        trace!("Received timestamp does not match date-time grammar: {text}");
        return None;
    }

    DateTime::parse_from_rfc2822(&text)
        .inspect_err(|e| trace!("Received timestamp rejected ({e}): {text}"))
        .ok()
}

