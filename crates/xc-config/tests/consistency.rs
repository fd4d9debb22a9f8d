//! Whole-document consistency checks against a realistic config.

use xc_config::{
    find_duplicate_outbound, find_duplicate_tags, is_valid_address, preflight,
    validate_balancer_record, validate_outbound_record, Balancer, Document, IssueCode,
    OutboundRecord, Severity,
};

const SAMPLE: &str = r#"{
  "log": {"loglevel": "warning"},
  "inbounds": [
    {"tag": "socks-in", "protocol": "socks", "listen": "127.0.0.1", "port": 10808,
     "settings": {"udp": true}},
    {"tag": "vless-in", "protocol": "vless", "port": "443",
     "settings": {"clients": [{"id": "550e8400-e29b-41d4-a716-446655440000"}],
         "decryption": "none"}}
  ],
  "outbounds": [
    {"tag": "proxy-hk", "protocol": "vless",
     "settings": {"vnext": [{"address": "hk.example.com", "port": 443,
        "users": [{"id": "550e8400-e29b-41d4-a716-446655440000", "encryption": "none"}]}]},
     "streamSettings": {"network": "tcp", "security": "reality",
        "realitySettings": {"serverName": "www.microsoft.com", "publicKey": "abc",
            "shortId": "6ba8"}}},
    {"tag": "proxy-jp", "protocol": "trojan",
     "settings": {"servers": [{"address": "jp.example.com", "port": 443, "password": "pw"}]}},
    {"tag": "direct", "protocol": "freedom"},
    {"tag": "block", "protocol": "blackhole"}
  ],
  "routing": {
    "domainStrategy": "IPIfNonMatch",
    "rules": [
      {"domain": ["geosite:cn"], "outboundTag": "direct"},
      {"ip": ["geoip:private"], "outboundTag": "block"},
      {"network": "tcp,udp", "balancerTag": "auto"}
    ],
    "balancers": [{"tag": "auto", "selector": ["proxy-"], "strategy": {"type": "leastPing"}}]
  },
  "observatory": {"subjectSelector": ["proxy-"]}
}"#;

#[test]
fn sample_document_passes_preflight() -> anyhow::Result<()> {
    let doc = Document::from_json(SAMPLE)?;
    let report = preflight(&doc);
    assert!(report.is_clean(), "{:#?}", report.issues);
    assert!(doc.extra.contains_key("observatory"));
    Ok(())
}

#[test]
fn clearing_selector_is_fatal_and_blocks() -> anyhow::Result<()> {
    let mut doc = Document::from_json(SAMPLE)?;
    if let Some(routing) = doc.routing.as_mut() {
        routing.balancers[0].selector.clear();
    }
    let report = preflight(&doc);
    assert!(report.is_push_blocked());
    assert_eq!(report.worst(), Some(Severity::Fatal));
    Ok(())
}

#[test]
fn balancer_examples() {
    let empty = Balancer {
        tag: "b1".into(),
        selector: vec![],
        ..Default::default()
    };
    let issues = validate_balancer_record(&empty);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "selector");
    assert_eq!(issues[0].code, IssueCode::EmptySelector);

    let ok = Balancer {
        tag: "b1".into(),
        selector: vec!["out-1".into()],
        ..Default::default()
    };
    assert!(validate_balancer_record(&ok).is_empty());
}

#[test]
fn unknown_outbound_protocol() -> anyhow::Result<()> {
    let rec: OutboundRecord =
        serde_json::from_str(r#"{"tag": "x", "protocol": "reality-proxy"}"#)?;
    let issues = validate_outbound_record(&rec);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "protocol");
    Ok(())
}

#[test]
fn address_examples() {
    assert!(is_valid_address("8.8.8.8"));
    assert!(is_valid_address("example.com"));
    assert!(is_valid_address("localhost"));
    assert!(!is_valid_address(""));
    assert!(!is_valid_address("not a domain!!"));
    assert!(!is_valid_address("999.999.999.999"));
}

#[test]
fn inbound_outbound_tag_clash_is_case_insensitive() -> anyhow::Result<()> {
    let doc = Document::from_json(
        r#"{"inbounds": [{"tag": "In1", "protocol": "socks", "port": 1080}],
            "outbounds": [{"tag": "in1", "protocol": "freedom"}]}"#,
    )?;
    let dups = find_duplicate_tags(&doc);
    assert_eq!(dups.len(), 1);
    assert!(dups[0].eq_ignore_ascii_case("in1"));
    Ok(())
}

#[test]
fn editing_an_outbound_into_a_copy_of_another() -> anyhow::Result<()> {
    let doc = Document::from_json(SAMPLE)?;
    let mut edited = doc.outbounds[1].clone();
    edited.tag = "proxy-jp-2".into();
    assert_eq!(
        find_duplicate_outbound(&edited, &doc.outbounds, None).as_deref(),
        Some("proxy-jp")
    );
    // editing the record in place must not match itself
    assert_eq!(find_duplicate_outbound(&edited, &doc.outbounds, Some(1)), None);
    Ok(())
}

#[test]
fn wrong_typed_fields_import_and_are_flagged() -> anyhow::Result<()> {
    let doc = Document::from_json(
        r#"{
          "outbounds": [
            {"tag": "proxy-a", "protocol": "freedom"},
            {"tag": null, "protocol": "freedom"},
            {"tag": "odd", "protocol": 5}
          ],
          "routing": {"balancers": [
            {"tag": "lb-null", "selector": null},
            {"tag": "lb-text", "selector": "proxy-"}
          ]}
        }"#,
    )?;
    assert_eq!(doc.outbounds.len(), 3);
    assert_eq!(doc.balancers().len(), 2);

    let report = preflight(&doc);
    assert!(report.is_push_blocked());
    let fatal: Vec<_> = report
        .fatal()
        .map(|i| (i.ptr.as_str(), i.issue.field.as_str()))
        .collect();
    assert_eq!(
        fatal,
        [
            ("/routing/balancers/0", "selector"),
            ("/routing/balancers/1", "selector")
        ]
    );

    let flagged: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.issue.severity == Severity::Error)
        .map(|i| (i.ptr.as_str(), i.issue.field.as_str(), i.issue.code))
        .collect();
    assert_eq!(
        flagged,
        [
            ("/outbounds/1", "tag", IssueCode::InvalidType),
            ("/outbounds/2", "protocol", IssueCode::InvalidType)
        ]
    );

    let back: serde_json::Value = serde_json::from_str(&doc.to_json_pretty()?)?;
    assert_eq!(back["outbounds"][1]["tag"], serde_json::Value::Null);
    assert_eq!(back["outbounds"][2]["protocol"], 5);
    Ok(())
}
