//! Authentication-Results and Received-SPF parsing.
//!
//! Results are extracted as claimed by the receiving host. Nothing here
//! verifies a signature or re-evaluates a policy.

use crate::tokens::{Token, TokenKind, tokenize};
use crate::types::{AuthOutcome, AuthResult, AuthResults, Mechanism, SpfResult};
use tracing::trace;

/// Parse an Authentication-Results (or ARC-Authentication-Results) value
#[must_use]
pub fn parse_authentication_results(value: &str) -> AuthResults {
    let tokens = tokenize(value);
    let mut clauses: Vec<&[Token<'_>]> = tokens
        .split(|t| t.kind == TokenKind::Separator)
        .filter(|clause| !clause.is_empty())
        .collect();

    let mut results = AuthResults::default();

    // ARC: `i=1; authserv-id; ...`
    if let Some(instance) = clauses.first().and_then(|c| arc_instance(c)) {
        results.instance = Some(instance);
        clauses.remove(0);
    }

    let mut current: Option<AuthResult> = None;

    for (index, clause) in clauses.iter().enumerate() {
        // a `;` always closes the open result
        results.results.extend(current.take());
        let mut rest: &[Token<'_>] = clause;

        if index == 0
            && let Some(first) = rest.first()
            && first.is_word()
            && !first.text.contains('=')
        {
            results.authserv_id = Some(first.text.to_string());
            rest = &rest[1..];
            if let Some(version) = rest
                .first()
                .filter(|t| t.is_word())
                .and_then(|t| t.text.parse::<u32>().ok())
            {
                results.version = Some(version);
                rest = &rest[1..];
            }
        }

        // `none` alone means no results; any other leading bare word names an
        // opaque mechanism that owns the rest of the clause
        if let Some(first) = rest.first()
            && first.is_word()
            && !first.text.contains('=')
        {
            rest = &rest[1..];
            if first.text.eq_ignore_ascii_case("none") && rest.is_empty() {
                continue;
            }
            trace!("Opaque authentication clause: {}", first.text);
            current = Some(AuthResult {
                mechanism: Mechanism::from_name(first.text),
                result: AuthOutcome::None,
                reason: None,
                properties: Vec::new(),
            });
        }

        let mut i = 0;
        while i < rest.len() {
            let token = rest[i];
            i += 1;

            match token.kind {
                TokenKind::Word => {
                    let Some((key, inline)) = token.text.split_once('=') else {
                        trace!("Ignoring bare token in Authentication-Results: {}", token.text);
                        continue;
                    };
                    let Some(value) = property_value(inline, rest, &mut i) else {
                        trace!("Ignoring empty property in Authentication-Results: {key}");
                        continue;
                    };

                    let starts_group = !key.contains('.')
                        && (current.is_none() || Mechanism::is_known(key));

                    if starts_group {
                        results.results.extend(current.take());
                        let mechanism = Mechanism::from_name(key);
                        if let Mechanism::Other(name) = &mechanism {
                            trace!("Opaque authentication mechanism: {name}");
                        }
                        current = Some(AuthResult {
                            mechanism,
                            result: AuthOutcome::parse(&value),
                            reason: None,
                            properties: Vec::new(),
                        });
                    } else if let Some(result) = current.as_mut() {
                        if key.eq_ignore_ascii_case("reason") && result.reason.is_none() {
                            result.reason = Some(value);
                        } else {
                            result.properties.push((key.to_string(), value));
                        }
                    } else {
                        trace!("Ignoring property outside any result: {key}");
                    }
                }
                TokenKind::Comment => {
                    if let Some(result) = current.as_mut()
                        && result.reason.is_none()
                        && result.properties.is_empty()
                    {
                        let comment = token.inner();
                        if !comment.is_empty() {
                            result.reason = Some(comment.to_string());
                        }
                    }
                }
                TokenKind::Quoted | TokenKind::Separator => {}
            }
        }
    }

    results.results.extend(current);
    results
}

/// Parse a Received-SPF value, e.g.
/// `pass (example.com: domain of a@b designates 1.2.3.4 as permitted sender) client-ip=1.2.3.4;`
#[must_use]
pub fn parse_received_spf(value: &str) -> SpfResult {
    let tokens = tokenize(value);

    let mut rest: &[Token<'_>] = &tokens;
    let mut result = None;
    let mut reason = None;

    if let Some(first) = rest.first()
        && first.is_word()
        && !first.text.contains('=')
    {
        result = Some(AuthOutcome::parse(first.text));
        rest = &rest[1..];

        if let Some(comment) = rest.first().filter(|t| t.kind == TokenKind::Comment) {
            reason = Some(comment.inner().to_string()).filter(|r| !r.is_empty());
            rest = &rest[1..];
        }
    }

    let mut properties = Vec::new();
    let mut i = 0;
    while i < rest.len() {
        let token = rest[i];
        i += 1;

        if let Some((key, inline)) = token.text.split_once('=')
            && token.is_word()
        {
            if let Some(value) = property_value(inline, rest, &mut i) {
                properties.push((key.to_string(), value));
            }
        }
    }

    SpfResult {
        result,
        reason,
        properties,
    }
}

/// Value of a `key=value` token. `key="quoted value"` tokenizes as `key=`
/// followed by a quoted string, which is consumed here.
fn property_value(inline: &str, tokens: &[Token<'_>], next: &mut usize) -> Option<String> {
    if !inline.is_empty() {
        return Some(inline.trim_matches('"').to_string());
    }
    match tokens.get(*next) {
        Some(token) if token.kind == TokenKind::Quoted => {
            *next += 1;
            Some(token.inner().to_string()).filter(|v| !v.is_empty())
        }
        _ => None,
    }
}

fn arc_instance(clause: &[Token<'_>]) -> Option<u32> {
    match clause {
        [only] if only.is_word() => only
            .text
            .strip_prefix("i=")
            .and_then(|n| n.parse::<u32>().ok()),
        _ => None,
    }
}
