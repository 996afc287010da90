//! Error types for mail parsing

use thiserror::Error;

/// Errors surfaced by the parser.
///
/// Malformed or unrecognised header and body shapes never produce an error;
/// they degrade to absent values. The only failure is a caller handing in
/// something that is not text.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Input supplied where message text is required is not text
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for mail parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;
