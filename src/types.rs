//! Core types for parsed mail

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// A decomposed message: headers and body blocks, both in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mail {
    /// Every header, duplicates preserved in the order they appear
    pub headers: Vec<Header>,

    /// Body segments
    pub blocks: Vec<Block>,
}

impl Mail {
    /// First header with the given name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.name_is(name))
    }

    /// All headers with the given name (case-insensitive), in source order
    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Header> + 'a {
        self.headers.iter().filter(move |h| h.name_is(name))
    }

    /// One hop per Received header, in the order the headers appear
    pub fn hops(&self) -> impl Iterator<Item = &Hop> {
        self.headers.iter().filter_map(|h| match &h.structured {
            StructuredHeader::Received(hop) => Some(hop),
            _ => None,
        })
    }

    /// Parsed Authentication-Results (and ARC-Authentication-Results) headers
    pub fn auth_results(&self) -> impl Iterator<Item = &AuthResults> {
        self.headers.iter().filter_map(|h| match &h.structured {
            StructuredHeader::AuthenticationResults(results) => Some(results),
            _ => None,
        })
    }

    /// Parsed Received-SPF headers
    pub fn spf_results(&self) -> impl Iterator<Item = &SpfResult> {
        self.headers.iter().filter_map(|h| match &h.structured {
            StructuredHeader::ReceivedSpf(spf) => Some(spf),
            _ => None,
        })
    }

    /// Every IP literal found across the hops, for enrichment lookups
    pub fn ip_literals(&self) -> impl Iterator<Item = &IpLiteral> {
        self.hops().flat_map(Hop::ip_literals)
    }
}

/// A single header line, unfolded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name as written in the source
    pub name: String,

    /// Raw header value
    pub value: String,

    /// Structured form, when the name selects a specialised parser
    pub structured: StructuredHeader,
}

impl Header {
    /// Case-insensitive name comparison
    #[must_use]
    pub fn name_is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    #[must_use]
    pub const fn kind(&self) -> HeaderKind {
        self.structured.kind()
    }
}

/// Which parser a header name routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderKind {
    Received,
    AuthenticationResults,
    ReceivedSpf,
    Unclassified,
}

/// Parsed header payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructuredHeader {
    Received(Hop),
    AuthenticationResults(AuthResults),
    ReceivedSpf(SpfResult),
    /// Kept only as the raw name/value pair on the owning `Header`
    Unclassified,
}

impl StructuredHeader {
    #[must_use]
    pub const fn kind(&self) -> HeaderKind {
        match self {
            Self::Received(_) => HeaderKind::Received,
            Self::AuthenticationResults(_) => HeaderKind::AuthenticationResults,
            Self::ReceivedSpf(_) => HeaderKind::ReceivedSpf,
            Self::Unclassified => HeaderKind::Unclassified,
        }
    }
}

/// A network endpoint token: either a hostname or an IP literal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// The token verbatim
    Hostname(String),
    IpLiteral(IpLiteral),
}

impl Endpoint {
    #[must_use]
    pub const fn as_ip_literal(&self) -> Option<&IpLiteral> {
        match self {
            Self::IpLiteral(ip) => Some(ip),
            Self::Hostname(_) => None,
        }
    }

    #[must_use]
    pub fn as_hostname(&self) -> Option<&str> {
        match self {
            Self::Hostname(name) => Some(name),
            Self::IpLiteral(_) => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hostname(name) => write!(f, "{name}"),
            Self::IpLiteral(ip) => write!(f, "{ip}"),
        }
    }
}

/// An IPv4 or IPv6 address literal.
///
/// The `enrichment` slot is never filled by parsing. A GeoIP/WHOIS
/// collaborator may attach its findings afterwards through
/// [`IpLiteral::with_enrichment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpLiteral {
    pub address: IpAddr,
    pub enrichment: Option<serde_json::Value>,
}

impl IpLiteral {
    #[must_use]
    pub const fn new(address: IpAddr) -> Self {
        Self {
            address,
            enrichment: None,
        }
    }

    #[must_use]
    pub fn with_enrichment(self, enrichment: serde_json::Value) -> Self {
        Self {
            enrichment: Some(enrichment),
            ..self
        }
    }
}

impl fmt::Display for IpLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// One relay, parsed from a single Received header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub from: FromClause,
    pub by: ByClause,

    /// Envelope recipient from the `for` clause, angle brackets removed
    pub for_address: Option<String>,

    pub starttls: Option<Starttls>,

    /// Trailing date-time, zone offset kept as written
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// Original header value; absent only when no header was supplied
    pub raw: Option<String>,
}

impl Hop {
    /// IP literals named by this hop: from-host, from-ip, by-recipient
    pub fn ip_literals(&self) -> impl Iterator<Item = &IpLiteral> {
        let from_host = self.from.host.as_ref().and_then(Endpoint::as_ip_literal);
        let recipient = self.by.recipient.as_ref().and_then(Endpoint::as_ip_literal);

        [from_host, self.from.ip.as_ref(), recipient]
            .into_iter()
            .flatten()
    }
}

/// The `from` clause of a Received header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromClause {
    /// Name the sender announced in HELO/EHLO
    pub helo: Option<String>,

    /// Name the receiving MTA resolved for the peer
    pub host: Option<Endpoint>,

    /// Bracketed peer address
    pub ip: Option<IpLiteral>,
}

/// The `by` clause of a Received header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByClause {
    pub recipient: Option<Endpoint>,

    /// Free text after the recipient (software versions, organisation names)
    pub recipient_additional: Option<String>,

    pub protocol: Option<String>,
    pub id: Option<String>,
}

/// TLS annotation such as `(version=TLS1_2 cipher=ECDHE-RSA-AES128-GCM-SHA256)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Starttls {
    pub version: String,
    pub cipher: String,
}

/// All results carried by one Authentication-Results header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResults {
    /// Host that performed the checks
    pub authserv_id: Option<String>,

    pub version: Option<u32>,

    /// ARC instance number, for ARC-Authentication-Results
    pub instance: Option<u32>,

    pub results: Vec<AuthResult>,
}

/// One mechanism outcome, e.g. `dkim=pass header.d=example.com`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub mechanism: Mechanism,
    pub result: AuthOutcome,

    /// Parenthetical comment following the result
    pub reason: Option<String>,

    /// `key=value` pairs in source order; keys may repeat
    pub properties: Vec<(String, String)>,
}

impl AuthResult {
    /// First value for `key`
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Authentication mechanism
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mechanism {
    Spf,
    Dkim,
    Dmarc,
    /// Any other method name (arc, compauth, auth, ...), kept verbatim
    Other(String),
}

impl Mechanism {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "spf" => Self::Spf,
            "dkim" => Self::Dkim,
            "dmarc" => Self::Dmarc,
            _ => Self::Other(name.to_string()),
        }
    }

    /// Whether `name` is one of the recognised mechanisms
    #[must_use]
    pub fn is_known(name: &str) -> bool {
        !matches!(Self::from_name(name), Self::Other(_))
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spf => write!(f, "spf"),
            Self::Dkim => write!(f, "dkim"),
            Self::Dmarc => write!(f, "dmarc"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Claimed outcome of an authentication check. Not verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthOutcome {
    Pass,
    Fail,
    SoftFail,
    Neutral,
    None,
    /// temperror, permerror, policy, ... kept verbatim
    Other(String),
}

impl AuthOutcome {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "pass" => Self::Pass,
            "fail" => Self::Fail,
            "softfail" => Self::SoftFail,
            "neutral" => Self::Neutral,
            "none" => Self::None,
            _ => Self::Other(value.to_string()),
        }
    }
}

/// A parsed Received-SPF header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpfResult {
    /// Leading result word; absent when the header does not start with one
    pub result: Option<AuthOutcome>,

    /// Comment following the result word
    pub reason: Option<String>,

    /// client-ip, envelope-from, helo, ... in source order
    pub properties: Vec<(String, String)>,
}

impl SpfResult {
    /// First value for `key`
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Shape of a body segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Plain,
    /// Every line looks like `Name: value`, as in a forwarded message
    HeaderShaped,
}

/// A contiguous body segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,

    /// Lines exactly as they appear in the body
    pub lines: Vec<String>,

    /// Headers of a header-shaped block. The fragment never has blocks of its own.
    pub mail: Option<Box<Mail>>,
}

impl Block {
    #[must_use]
    pub const fn is_header_shaped(&self) -> bool {
        matches!(self.kind, BlockKind::HeaderShaped)
    }
}
