//! Body segmentation into plain and header-shaped blocks

use crate::classifier::TokenClassifier;
use crate::header::parse_header;
use crate::parser::ParserOptions;
use crate::types::{Block, BlockKind, Mail};
use regex::Regex;
use std::sync::LazyLock;

// `Name:value` is accepted without a space unless the value starts with `/`,
// which keeps `https://...` lines out.
static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9_-]*):(?:[ \t]+(.*)|([^/ \t].*))?$").unwrap()
});

static QUOTE_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:>[ \t]?)+").unwrap());

/// Split body text into ordered segments.
///
/// Blank lines always end a segment. Inside a paragraph a new segment starts
/// where a run of header lines (with their folded continuations) begins and
/// another where it ends, so a forward marker or prose directly above or
/// below the headers stays a separate plain block.
///
/// Header-shaped blocks carry a flat Mail fragment holding their headers.
/// Whatever follows them (the forwarded body) becomes further blocks at the
/// same level, so nesting never goes deeper than one fragment.
#[must_use]
pub fn parse_blocks(
    body: &str,
    classifier: &dyn TokenClassifier,
    options: &ParserOptions,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in body.lines() {
        if unquote(line, options).trim().is_empty() {
            push_segments(&paragraph, classifier, options, &mut blocks);
            paragraph.clear();
        } else {
            paragraph.push(line);
        }
    }
    push_segments(&paragraph, classifier, options, &mut blocks);

    blocks
}

fn push_segments(
    paragraph: &[&str],
    classifier: &dyn TokenClassifier,
    options: &ParserOptions,
    blocks: &mut Vec<Block>,
) {
    let mut start = 0;
    let mut index = 0;

    while index < paragraph.len() {
        let (len, header_lines) = header_run(&paragraph[index..], options);
        if len > 0 && header_lines >= options.min_header_lines.max(1) {
            if start < index {
                blocks.push(build_block(&paragraph[start..index], classifier, options));
            }
            blocks.push(build_block(&paragraph[index..index + len], classifier, options));
            index += len;
            start = index;
        } else {
            index += len.max(1);
        }
    }

    if start < paragraph.len() {
        blocks.push(build_block(&paragraph[start..], classifier, options));
    }
}

/// Length of the header run opening `lines`, and how many header lines it holds
fn header_run(lines: &[&str], options: &ParserOptions) -> (usize, usize) {
    let mut len = 0;
    let mut header_lines = 0;

    for line in lines.iter().map(|l| unquote(l, options)) {
        if HEADER_LINE.is_match(line) {
            header_lines += 1;
        } else if len == 0 || !is_continuation(line) {
            break;
        }
        len += 1;
    }

    (len, header_lines)
}

/// Header-shaped when every line is `Name: value` or a folded continuation
#[must_use]
pub fn classify_block(lines: &[&str], options: &ParserOptions) -> BlockKind {
    let mut header_lines = 0;

    for (index, line) in lines.iter().map(|l| unquote(l, options)).enumerate() {
        if HEADER_LINE.is_match(line) {
            header_lines += 1;
        } else if index == 0 || !is_continuation(line) {
            return BlockKind::Plain;
        }
    }

    if header_lines >= options.min_header_lines.max(1) {
        BlockKind::HeaderShaped
    } else {
        BlockKind::Plain
    }
}

fn build_block(lines: &[&str], classifier: &dyn TokenClassifier, options: &ParserOptions) -> Block {
    let kind = classify_block(lines, options);
    let mail = match kind {
        BlockKind::HeaderShaped => Some(Box::new(header_fragment(lines, classifier, options))),
        BlockKind::Plain => None,
    };

    Block {
        kind,
        lines: lines.iter().map(ToString::to_string).collect(),
        mail,
    }
}

fn header_fragment(lines: &[&str], classifier: &dyn TokenClassifier, options: &ParserOptions) -> Mail {
    let mut fields: Vec<(String, String)> = Vec::new();

    for line in lines.iter().map(|l| unquote(l, options)) {
        if let Some(caps) = HEADER_LINE.captures(line) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str().trim_end());
            fields.push((caps[1].to_string(), value.to_string()));
        } else if let Some((_, value)) = fields.last_mut() {
            let continuation = line.trim();
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(continuation);
        }
    }

    Mail {
        headers: fields
            .iter()
            .map(|(name, value)| parse_header(name, value, classifier))
            .collect(),
        blocks: Vec::new(),
    }
}

fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t'])
}

fn unquote<'a>(line: &'a str, options: &ParserOptions) -> &'a str {
    if options.unquote_body {
        QUOTE_PREFIX
            .find(line)
            .map_or(line, |m| &line[m.end()..])
    } else {
        line
    }
}
