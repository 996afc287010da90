//! Clause tokenizer shared by the Received and authentication parsers.
//!
//! Splits a header value into whitespace-separated words, parenthesised
//! comments (nesting honoured, one token each), quoted strings and `;`
//! separators. Keywords inside a comment are therefore never mistaken for
//! clause keywords. Unterminated comments and quotes run to end of input.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word,
    Comment,
    Quoted,
    Separator,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    /// Slice of the source, delimiters included
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> Token<'a> {
    /// Text without the surrounding parentheses or quotes, trimmed
    pub fn inner(&self) -> &'a str {
        let text = match self.kind {
            TokenKind::Comment => {
                let t = self.text.strip_prefix('(').unwrap_or(self.text);
                t.strip_suffix(')').unwrap_or(t)
            }
            TokenKind::Quoted => {
                let t = self.text.strip_prefix('"').unwrap_or(self.text);
                t.strip_suffix('"').unwrap_or(t)
            }
            TokenKind::Word | TokenKind::Separator => self.text,
        };
        text.trim()
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    /// Case-insensitive keyword test; only bare words qualify
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.is_word() && self.text.eq_ignore_ascii_case(keyword)
    }
}

pub(crate) fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let kind = match c {
            b'(' => {
                i = comment_end(bytes, i);
                TokenKind::Comment
            }
            b'"' => {
                i = quoted_end(bytes, i);
                TokenKind::Quoted
            }
            b';' => {
                i += 1;
                TokenKind::Separator
            }
            _ => {
                while i < bytes.len() && !is_word_delimiter(bytes[i]) {
                    i += 1;
                }
                TokenKind::Word
            }
        };

        tokens.push(Token {
            kind,
            text: &input[start..i],
            start,
            end: i,
        });
    }

    tokens
}

/// Slice of `source` covering `tokens`, or `None` when empty
pub(crate) fn span<'a>(source: &'a str, tokens: &[Token<'_>]) -> Option<&'a str> {
    let first = tokens.first()?;
    let last = tokens.last()?;
    source.get(first.start..last.end)
}

const fn is_word_delimiter(c: u8) -> bool {
    c.is_ascii_whitespace() || matches!(c, b'(' | b'"' | b';')
}

fn comment_end(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn quoted_end(bytes: &[u8], open: usize) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'"' => return i + 1,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}
