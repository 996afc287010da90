use phish_trace::*;
use std::net::IpAddr;

fn ip(s: &str) -> IpLiteral {
    IpLiteral::new(s.parse::<IpAddr>().unwrap())
}

fn host(s: &str) -> Endpoint {
    Endpoint::Hostname(s.to_string())
}

const GMAIL_HOP: &str = "from mail-sor-f41.google.com (mail-sor-f41.google.com. [209.85.220.41])\r\n        \
    by mx.google.com with SMTPS id a1sor123456wrb.12.2020.06.26.06.27.53\r\n        \
    for <victim@example.com>\r\n        \
    (Google Transport Security);\r\n        \
    Fri, 26 Jun 2020 06:27:53 -0700 (PDT)";

// --- ByParser ---

#[test]
fn test_by_absent_value() {
    let by = parse_by(None, &IpTokenClassifier);
    assert_eq!(by, ByClause::default());
    assert!(by.recipient.is_none());
    assert!(by.recipient_additional.is_none());
    assert!(by.protocol.is_none());
    assert!(by.id.is_none());
}

#[test]
fn test_by_sample_1() {
    let by = parse_by(
        Some("by mx.google.com with ESMTPS id u23si16237783eds.526.2020.06.26.06.27.53 "),
        &IpTokenClassifier,
    );
    assert_eq!(by.recipient, Some(host("mx.google.com")));
    assert_eq!(by.recipient_additional, None);
    assert_eq!(by.protocol.as_deref(), Some("ESMTPS"));
    assert_eq!(
        by.id.as_deref(),
        Some("u23si16237783eds.526.2020.06.26.06.27.53")
    );
}

#[test]
fn test_by_sample_2() {
    let by = parse_by(
        Some("by still.dodgy.host.com (8.14.7/8.14.7/Submit) id 05QDRrso001911 "),
        &IpTokenClassifier,
    );
    assert_eq!(by.recipient, Some(host("still.dodgy.host.com")));
    assert_eq!(by.recipient_additional.as_deref(), Some("8.14.7/8.14.7/Submit"));
    assert_eq!(by.protocol, None);
    assert_eq!(by.id.as_deref(), Some("05QDRrso001911"));
}

#[test]
fn test_by_sample_3() {
    let by = parse_by(
        Some("by 10.0.0.1 Fuzzy Corp with SMTP id 3gJek488nka743gKRkR2nY"),
        &IpTokenClassifier,
    );
    assert_eq!(by.recipient, Some(Endpoint::IpLiteral(ip("10.0.0.1"))));
    assert_eq!(by.recipient_additional.as_deref(), Some("Fuzzy Corp"));
    assert_eq!(by.protocol.as_deref(), Some("SMTP"));
    assert_eq!(by.id.as_deref(), Some("3gJek488nka743gKRkR2nY"));
}

#[test]
fn test_by_sample_4() {
    let by = parse_by(
        Some(" by mx.google.com (8.14.7/8.14.7) with ESMTP id b201si8173212pfb.88.2020.04.25.22.14.05 "),
        &IpTokenClassifier,
    );
    assert_eq!(by.recipient, Some(host("mx.google.com")));
    assert_eq!(by.recipient_additional.as_deref(), Some("8.14.7/8.14.7"));
    assert_eq!(by.protocol.as_deref(), Some("ESMTP"));
    assert_eq!(
        by.id.as_deref(),
        Some("b201si8173212pfb.88.2020.04.25.22.14.05")
    );
}

#[test]
fn test_by_sample_5() {
    let by = parse_by(
        Some("by foo.bar-host.baz (Postfix, from userid 0) "),
        &IpTokenClassifier,
    );
    assert_eq!(by.recipient, Some(host("foo.bar-host.baz")));
    assert_eq!(by.recipient_additional.as_deref(), Some("Postfix, from userid 0"));
    assert_eq!(by.protocol, None);
    assert_eq!(by.id, None);
}

#[test]
fn test_by_missing_keyword() {
    for value in [
        "from a.example (a.example [192.0.2.1]); Fri, 26 Jun 2020 06:27:53 -0700",
        "with ESMTP id 12345",
        "",
        "(by mx.example.com with SMTP id 9)",
    ] {
        assert_eq!(parse_by(Some(value), &IpTokenClassifier), ByClause::default(), "{value}");
    }
}

#[test]
fn test_by_lone_word_is_not_additional() {
    let by = parse_by(Some("by mx.example.com Postfix with ESMTP id 1"), &IpTokenClassifier);
    assert_eq!(by.recipient_additional, None);
    assert_eq!(by.protocol.as_deref(), Some("ESMTP"));
}

#[test]
fn test_by_protocol_phrase_without_free_text() {
    let by = parse_by(
        Some("by BN6PR11MB.namprd11.prod.outlook.com with Microsoft SMTP Server (version=TLS1_2, cipher=TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384) id 15.20.2516.12 via Frontend Transport"),
        &IpTokenClassifier,
    );
    assert_eq!(by.recipient_additional, None);
    assert_eq!(by.protocol.as_deref(), Some("Microsoft SMTP Server"));
    assert_eq!(by.id.as_deref(), Some("15.20.2516.12"));
}

#[test]
fn test_by_protocol_phrase_after_free_text() {
    let by = parse_by(
        Some("by BN6PR11MB.namprd11.prod.outlook.com (2603:10b6:404::12) with Microsoft SMTP Server id 15.20.2516.12"),
        &IpTokenClassifier,
    );
    assert_eq!(by.recipient_additional.as_deref(), Some("2603:10b6:404::12"));
    assert_eq!(by.protocol, None);
    assert_eq!(by.id.as_deref(), Some("15.20.2516.12"));
}

#[test]
fn test_by_quoted_free_text_drops_quotes() {
    let by = parse_by(
        Some("by relay.example \"Acme Relay\" with SMTP id 42"),
        &IpTokenClassifier,
    );
    assert_eq!(by.recipient, Some(host("relay.example")));
    assert_eq!(by.recipient_additional.as_deref(), Some("Acme Relay"));
    assert_eq!(by.protocol.as_deref(), Some("SMTP"));
    assert_eq!(by.id.as_deref(), Some("42"));
}

#[test]
fn test_by_within_full_header() {
    let by = parse_by(
        Some("from a.example by b.example (Postfix) with ESMTP id 4C1F2 for <x@y.example>; Tue, 13 Jun 2023 19:01:08 +0000"),
        &IpTokenClassifier,
    );
    assert_eq!(by.recipient, Some(host("b.example")));
    assert_eq!(by.recipient_additional.as_deref(), Some("Postfix"));
    assert_eq!(by.protocol.as_deref(), Some("ESMTP"));
    assert_eq!(by.id.as_deref(), Some("4C1F2"));
}

// --- FromParser ---

#[test]
fn test_from_host_and_ip() {
    let from = parse_from(
        Some("from mail.example.org (mail.example.org [8.8.8.8]) by inbound.filter.local (Postfix) with ESMTPS id 12345"),
        &IpTokenClassifier,
    );
    assert_eq!(from.helo.as_deref(), Some("mail.example.org"));
    assert_eq!(from.host, Some(host("mail.example.org")));
    assert_eq!(from.ip, Some(ip("8.8.8.8")));
}

#[test]
fn test_from_ip_only() {
    let from = parse_from(Some("from User-PC ([2001:db8::1]) by mail.example.org"), &IpTokenClassifier);
    assert_eq!(from.helo.as_deref(), Some("User-PC"));
    assert_eq!(from.host, None);
    assert_eq!(from.ip, Some(ip("2001:db8::1")));
}

#[test]
fn test_from_unbracketed_address_is_host() {
    let from = parse_from(
        Some("from DM6PR11MB.namprd11.prod.outlook.com (2603:10b6:5:1c0::26) by BN6PR11MB.namprd11.prod.outlook.com"),
        &IpTokenClassifier,
    );
    assert_eq!(from.host, Some(Endpoint::IpLiteral(ip("2603:10b6:5:1c0::26"))));
    assert_eq!(from.ip, None);
}

#[test]
fn test_from_exim_helo_comment() {
    let from = parse_from(Some("from [10.0.0.5] (helo=foo.example) by mx.example"), &IpTokenClassifier);
    assert_eq!(from.helo.as_deref(), Some("[10.0.0.5]"));
    assert_eq!(from.host, None);
    assert_eq!(from.ip, None);
}

#[test]
fn test_from_bracketed_garbage_is_not_ip() {
    let from = parse_from(Some("from laptop (unknown [not-an-ip]) by mx.example"), &IpTokenClassifier);
    assert_eq!(from.host, Some(host("unknown")));
    assert_eq!(from.ip, None);
}

#[test]
fn test_from_absent() {
    assert_eq!(parse_from(None, &IpTokenClassifier), FromClause::default());
    assert_eq!(
        parse_from(Some("by mx.example with SMTP"), &IpTokenClassifier),
        FromClause::default()
    );
}

// --- ForParser ---

#[test]
fn test_for_strips_angle_brackets() {
    assert_eq!(
        parse_for(Some("by mx.example with SMTP id 1 for <victim@example.com>; Fri, 26 Jun 2020 06:27:53 -0700")).as_deref(),
        Some("victim@example.com")
    );
}

#[test]
fn test_for_bare_address() {
    assert_eq!(
        parse_for(Some("by mx.example for victim@example.com")).as_deref(),
        Some("victim@example.com")
    );
}

#[test]
fn test_for_absent() {
    assert_eq!(parse_for(None), None);
    assert_eq!(parse_for(Some("by mx.example with SMTP")), None);
    assert_eq!(parse_for(Some("by mx.example (envelope-from <a@b.example>)")), None);
    assert_eq!(parse_for(Some("by mx.example for <>")), None);
}

// --- StarttlsParser ---

#[test]
fn test_starttls_space_separated() {
    let tls = parse_starttls(Some(
        "by mx.google.com with ESMTPS id x (version=TLS1_2 cipher=ECDHE-ECDSA-AES128-GCM-SHA256 bits=128/128); Fri, 26 Jun 2020 06:27:53 -0700",
    ))
    .unwrap();
    assert_eq!(tls.version, "TLS1_2");
    assert_eq!(tls.cipher, "ECDHE-ECDSA-AES128-GCM-SHA256");
}

#[test]
fn test_starttls_comma_separated() {
    let tls = parse_starttls(Some(
        "with Microsoft SMTP Server (version=TLS1_2, cipher=TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384) id 15.20.2516.12",
    ))
    .unwrap();
    assert_eq!(tls.version, "TLS1_2");
    assert_eq!(tls.cipher, "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384");
}

#[test]
fn test_starttls_absent() {
    assert_eq!(parse_starttls(None), None);
    assert_eq!(parse_starttls(Some("by mx.example (Postfix) with ESMTP")), None);
    assert_eq!(parse_starttls(Some("by mx.example (version=TLS1_3)")), None);
}

// --- TimestampParser ---

#[test]
fn test_timestamp_keeps_offset() {
    let ts = parse_timestamp(Some(
        "by mx.example with SMTP id 1; Fri, 26 Jun 2020 06:27:53 -0700 (PDT)",
    ))
    .unwrap();
    assert_eq!(ts.offset().local_minus_utc(), -7 * 3600);
    assert_eq!(ts.to_rfc2822(), "Fri, 26 Jun 2020 06:27:53 -0700");
}

#[test]
fn test_timestamp_without_day_of_week() {
    let ts = parse_timestamp(Some("by mx.example; 3 Jan 2021 10:00:00 +0530")).unwrap();
    assert_eq!(ts.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
}

#[test]
fn test_timestamp_uses_last_separator() {
    let ts = parse_timestamp(Some(
        "by mx.example (a; b) with SMTP; Tue, 13 Jun 2023 19:01:08 +0000",
    ))
    .unwrap();
    assert_eq!(ts.to_rfc2822(), "Tue, 13 Jun 2023 19:01:08 +0000");
}

#[test]
fn test_timestamp_absent() {
    assert_eq!(parse_timestamp(None), None);
    assert_eq!(parse_timestamp(Some("by mx.example with SMTP")), None);
    assert_eq!(parse_timestamp(Some("by mx.example; yesterday")), None);
    assert_eq!(
        parse_timestamp(Some("by mx.example; Fri, 26 Jun 2020 06:27:53 GMT")),
        None
    );
}

// --- Received parser ---

#[test]
fn test_received_absent() {
    let hop = parse_received(None, &IpTokenClassifier);
    assert_eq!(hop, Hop::default());
    assert!(hop.raw.is_none());
}

#[test]
fn test_received_full_hop() {
    let hop = parse_received(Some(GMAIL_HOP), &IpTokenClassifier);

    assert_eq!(hop.from.helo.as_deref(), Some("mail-sor-f41.google.com"));
    assert_eq!(hop.from.host, Some(host("mail-sor-f41.google.com.")));
    assert_eq!(hop.from.ip, Some(ip("209.85.220.41")));

    assert_eq!(hop.by.recipient, Some(host("mx.google.com")));
    assert_eq!(hop.by.recipient_additional, None);
    assert_eq!(hop.by.protocol.as_deref(), Some("SMTPS"));
    assert_eq!(
        hop.by.id.as_deref(),
        Some("a1sor123456wrb.12.2020.06.26.06.27.53")
    );

    assert_eq!(hop.for_address.as_deref(), Some("victim@example.com"));
    assert_eq!(hop.starttls, None);
    assert_eq!(
        hop.timestamp.map(|ts| ts.to_rfc2822()).as_deref(),
        Some("Fri, 26 Jun 2020 06:27:53 -0700")
    );
    assert_eq!(hop.raw.as_deref(), Some(GMAIL_HOP));
}

#[test]
fn test_received_ip_literals() {
    let hop = parse_received(
        Some("from relay (relay [198.51.100.7]) by 10.0.0.1 with SMTP id 1"),
        &IpTokenClassifier,
    );
    let addresses: Vec<String> = hop.ip_literals().map(ToString::to_string).collect();
    assert_eq!(addresses, vec!["198.51.100.7", "10.0.0.1"]);
}

#[test]
fn test_received_is_idempotent() {
    let first = parse_received(Some(GMAIL_HOP), &IpTokenClassifier);
    let second = parse_received(Some(GMAIL_HOP), &IpTokenClassifier);
    assert_eq!(first, second);
}

#[test]
fn test_received_garbage_degrades() {
    let hop = parse_received(Some("((( unbalanced \"quote"), &IpTokenClassifier);
    assert_eq!(hop.from, FromClause::default());
    assert_eq!(hop.by, ByClause::default());
    assert_eq!(hop.for_address, None);
    assert_eq!(hop.timestamp, None);
    assert_eq!(hop.raw.as_deref(), Some("((( unbalanced \"quote"));
}
