//! Header classification and routing

use crate::auth::{parse_authentication_results, parse_received_spf};
use crate::classifier::TokenClassifier;
use crate::received::parse_received;
use crate::types::{Header, HeaderKind, StructuredHeader};

/// Select the parser for a header name (case-insensitive)
#[must_use]
pub fn classify_header(name: &str) -> HeaderKind {
    let name = name.trim();
    if name.eq_ignore_ascii_case("received") {
        HeaderKind::Received
    } else if name.eq_ignore_ascii_case("authentication-results")
        || name.eq_ignore_ascii_case("arc-authentication-results")
    {
        HeaderKind::AuthenticationResults
    } else if name.eq_ignore_ascii_case("received-spf") {
        HeaderKind::ReceivedSpf
    } else {
        HeaderKind::Unclassified
    }
}

/// Build a header, running the value through its specialised parser.
///
/// Unknown names are kept as raw name/value pairs.
#[must_use]
pub fn parse_header(name: &str, value: &str, classifier: &dyn TokenClassifier) -> Header {
    let structured = match classify_header(name) {
        HeaderKind::Received => StructuredHeader::Received(parse_received(Some(value), classifier)),
        HeaderKind::AuthenticationResults => {
            StructuredHeader::AuthenticationResults(parse_authentication_results(value))
        }
        HeaderKind::ReceivedSpf => StructuredHeader::ReceivedSpf(parse_received_spf(value)),
        HeaderKind::Unclassified => StructuredHeader::Unclassified,
    };

    Header {
        name: name.to_string(),
        value: value.to_string(),
        structured,
    }
}
