// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Provenance evidence from raw email
//!
//! Decomposes a message into classified headers and body blocks, turning
//! relay traces and authentication claims into typed records for phishing
//! forensics.
//!
//! # Features
//!
//! - Received headers parsed into hops (from/by/for/with/id, STARTTLS, timestamp)
//! - Authentication-Results and Received-SPF outcomes with their properties
//! - Hostname / IP literal tagging through a swappable [`TokenClassifier`]
//! - Forwarded or quoted header blocks in the body parsed into nested fragments
//! - Malformed input degrades to absent fields, never to an error
//!
//! # Example
//!
//! ```rust
//! use phish_trace::{Endpoint, parse_mail};
//!
//! let raw = b"Received: from mail.example.org (mail.example.org [192.0.2.7])\r\n \
//!             by mx.example.net with ESMTPS id 4Xy9;\r\n \
//!             Fri, 26 Jun 2020 06:27:53 -0700\r\n\
//!             Subject: Hello\r\n\r\nBody";
//! let mail = parse_mail(raw).unwrap();
//!
//! let hop = mail.hops().next().unwrap();
//! assert_eq!(hop.by.protocol.as_deref(), Some("ESMTPS"));
//! assert!(matches!(hop.by.recipient, Some(Endpoint::Hostname(_))));
//! ```

mod auth;
mod body;
mod classifier;
mod error;
mod header;
mod parser;
mod received;
mod tokens;
mod types;

pub use auth::{parse_authentication_results, parse_received_spf};
pub use body::{classify_block, parse_blocks};
pub use classifier::{IpTokenClassifier, TokenClassifier, parse_ip_literal};
pub use error::{ParseError, Result};
pub use header::{classify_header, parse_header};
pub use parser::{MailParser, ParserOptions, parse_mail};
pub use received::{
    parse_by, parse_for, parse_from, parse_received, parse_starttls, parse_timestamp,
};
pub use types::*;
