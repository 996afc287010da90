//! Main mail parser implementation

use crate::body::parse_blocks;
use crate::classifier::{IpTokenClassifier, TokenClassifier};
use crate::error::{ParseError, Result};
use crate::header::parse_header;
use crate::types::Mail;
use mailparse::MailParseError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tunables for body block classification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Strip leading `>` quote markers before classifying body lines
    pub unquote_body: bool,

    /// Minimum `Name: value` lines for a block to count as header-shaped
    pub min_header_lines: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            unquote_body: true,
            min_header_lines: 1,
        }
    }
}

/// Decomposes raw messages into a [`Mail`].
///
/// Holds no state between calls; the token classifier is the only
/// injected policy.
#[derive(Debug, Clone, Default)]
pub struct MailParser<C = IpTokenClassifier> {
    classifier: C,
    options: ParserOptions,
}

impl MailParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: TokenClassifier> MailParser<C> {
    /// Parser using a custom token classification strategy
    #[must_use]
    pub fn with_classifier(classifier: C) -> Self {
        Self {
            classifier,
            options: ParserOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(self, options: ParserOptions) -> Self {
        Self { options, ..self }
    }

    /// Parse raw message bytes.
    ///
    /// The bytes go to `mailparse` as they are, so 8-bit bodies in legacy
    /// charsets are decoded rather than rejected. Fails only when the message
    /// structure cannot be split and the bytes are not UTF-8 text either.
    pub fn parse(&self, raw: &[u8]) -> Result<Mail> {
        let mail = match mailparse::parse_mail(raw) {
            Ok(parsed) => self.decompose(&parsed),
            Err(e) => {
                let text = std::str::from_utf8(raw).map_err(|utf8| {
                    ParseError::InvalidArgument(format!(
                        "message is neither parseable ({e}) nor UTF-8 text ({utf8})"
                    ))
                })?;
                self.body_only(text, &e)
            }
        };
        Ok(summarize(mail))
    }

    /// Parse message text. Never fails; unrecognised shapes are kept raw.
    #[must_use]
    pub fn parse_str(&self, raw: &str) -> Mail {
        let mail = match mailparse::parse_mail(raw.as_bytes()) {
            Ok(parsed) => self.decompose(&parsed),
            Err(e) => self.body_only(raw, &e),
        };
        summarize(mail)
    }

    fn body_only(&self, text: &str, error: &MailParseError) -> Mail {
        warn!("Message structure not parseable, treating it as body text: {error}");
        Mail {
            headers: Vec::new(),
            blocks: parse_blocks(text, &self.classifier, &self.options),
        }
    }

    fn decompose(&self, parsed: &mailparse::ParsedMail) -> Mail {
        let headers = parsed
            .headers
            .iter()
            .map(|h| parse_header(&h.get_key(), &h.get_value(), &self.classifier))
            .collect();

        let body = extract_body_text(parsed);

        Mail {
            headers,
            blocks: parse_blocks(&body, &self.classifier, &self.options),
        }
    }
}

fn summarize(mail: Mail) -> Mail {
    debug!(
        "Parsed mail: {} headers, {} hops, {} blocks",
        mail.headers.len(),
        mail.hops().count(),
        mail.blocks.len()
    );
    mail
}

/// Parse raw message bytes with the default syntactic classifier
pub fn parse_mail(raw: &[u8]) -> Result<Mail> {
    MailParser::new().parse(raw)
}

fn extract_body_text(parsed: &mailparse::ParsedMail) -> String {
    let (text, html) = extract_body_parts(parsed);
    if text.is_empty() {
        html.unwrap_or_default()
    } else {
        text
    }
}

fn extract_body_parts(parsed: &mailparse::ParsedMail) -> (String, Option<String>) {
    let mut text = String::new();
    let mut html: Option<String> = None;

    if parsed.subparts.is_empty() {
        let body = decoded_body(parsed);
        if parsed.ctype.mimetype.to_lowercase().contains("text/html") {
            html = Some(body);
        } else {
            text = body;
        }
    } else {
        extract_body_recursive(parsed, &mut text, &mut html);
    }

    (text, html)
}

fn extract_body_recursive(
    parsed: &mailparse::ParsedMail,
    text: &mut String,
    html: &mut Option<String>,
) {
    for part in &parsed.subparts {
        let content_type = part.ctype.mimetype.to_lowercase();

        if part.subparts.is_empty() {
            if content_type.contains("text/plain") && text.is_empty() {
                *text = decoded_body(part);
            } else if content_type.contains("text/html") && html.is_none() {
                *html = Some(decoded_body(part));
            }
        } else {
            extract_body_recursive(part, text, html);
        }
    }
}

/// Transfer-decoded body, falling back to the raw bytes when decoding fails
fn decoded_body(part: &mailparse::ParsedMail) -> String {
    part.get_body().unwrap_or_else(|e| {
        warn!("Could not decode body part, keeping it raw: {e}");
        String::from_utf8_lossy(part.get_body_raw().unwrap_or_default().as_slice()).into_owned()
    })
}
