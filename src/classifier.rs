//! Token classification: IP literal or hostname

use crate::types::{Endpoint, IpLiteral};
use std::net::IpAddr;

/// Decides whether a bare token names an IP literal or a hostname.
///
/// Every sub-parser that classifies host tokens takes one of these, so the
/// policy can be swapped (in tests, or by an enrichment layer) without
/// touching the parsers. Implementations must be pure: no I/O, no state.
pub trait TokenClassifier {
    fn classify(&self, token: &str) -> Endpoint;
}

/// Purely syntactic classifier.
///
/// `1.2.3.4`, `[1.2.3.4]`, `2001:db8::1` and `[IPv6:2001:db8::1]` are IP
/// literals; anything else is a hostname holding the token verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpTokenClassifier;

impl TokenClassifier for IpTokenClassifier {
    fn classify(&self, token: &str) -> Endpoint {
        parse_ip_literal(token).map_or_else(
            || Endpoint::Hostname(token.to_string()),
            |address| Endpoint::IpLiteral(IpLiteral::new(address)),
        )
    }
}

impl<F> TokenClassifier for F
where
    F: Fn(&str) -> Endpoint,
{
    fn classify(&self, token: &str) -> Endpoint {
        self(token)
    }
}

/// Parse an optionally bracketed address literal
#[must_use]
pub fn parse_ip_literal(token: &str) -> Option<IpAddr> {
    let inner = token
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(token);

    match inner.get(..5) {
        Some(tag) if tag.eq_ignore_ascii_case("ipv6:") => inner[5..]
            .parse::<IpAddr>()
            .ok()
            .filter(IpAddr::is_ipv6),
        _ => inner.parse::<IpAddr>().ok(),
    }
}
