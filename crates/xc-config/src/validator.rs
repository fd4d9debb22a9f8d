//! Record-level consistency validation.
//! 记录级一致性校验。
//!
//! Each entry point returns every problem it finds, in field order, so a form
//! can show them all at once. An empty vector means the record is valid.
//! Validators never mutate and never fail; they only report.
//!
//! A known key that held the wrong JSON type at import is still in the
//! record's `extra` map and is reported as [`IssueCode::InvalidType`].

use serde_json::{Map, Value};
use xc_types::{FieldIssue, IssueCode};

use crate::address::{is_valid_address, is_valid_ip_address, is_valid_port, is_valid_uuid};
use crate::layout::resolve_endpoint;
use crate::lenient::{mistyped, mistyped_non_null};
use crate::model::{
    Balancer, InboundRecord, OutboundRecord, PortValue, Protocol, RoutingRule, Security,
};

fn check_tag(tag: &str, extra: &Map<String, Value>, issues: &mut Vec<FieldIssue>) {
    if mistyped(extra, "tag") {
        issues.push(FieldIssue::error(
            "tag",
            IssueCode::InvalidType,
            "tag must be a string",
        ));
    } else if tag.trim().is_empty() {
        issues.push(FieldIssue::error(
            "tag",
            IssueCode::MissingRequired,
            "tag is required",
        ));
    }
}

fn wrong_type(field: &str, expected: &str) -> FieldIssue {
    FieldIssue::error(
        field,
        IssueCode::InvalidType,
        format!("{field} must be {expected}"),
    )
}

fn port_ok(port: Option<&PortValue>) -> bool {
    port.is_some_and(|p| is_valid_port(&p.as_text()))
}

pub fn validate_inbound_record(record: &InboundRecord) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    check_tag(&record.tag, &record.extra, &mut issues);
    if mistyped(&record.extra, "protocol") {
        issues.push(wrong_type("protocol", "a string"));
    }

    if record.protocol != Protocol::Tun.as_str() && !port_ok(record.port.as_ref()) {
        issues.push(FieldIssue::error(
            "port",
            IssueCode::InvalidPort,
            "port must be an integer between 1 and 65535",
        ));
    }

    if let Some(listen) = &record.listen {
        if !is_valid_ip_address(listen) {
            issues.push(FieldIssue::error(
                "listen",
                IssueCode::InvalidAddress,
                format!("listen address {listen:?} is not an IP address"),
            ));
        }
    } else if mistyped_non_null(&record.extra, "listen") {
        issues.push(wrong_type("listen", "a string"));
    }

    match record.protocol_kind() {
        Some(p @ (Protocol::Vless | Protocol::Vmess | Protocol::Trojan)) => {
            match record.settings.get("clients").and_then(Value::as_array) {
                None => issues.push(FieldIssue::error(
                    "clients",
                    IssueCode::MissingRequired,
                    "settings.clients must be an array",
                )),
                Some(clients) if p.uses_uuid() => {
                    for (i, client) in clients.iter().enumerate() {
                        let id = client.get("id").and_then(Value::as_str).unwrap_or("");
                        if !is_valid_uuid(id) {
                            issues.push(FieldIssue::error(
                                "clients",
                                IssueCode::InvalidUuid,
                                format!("client #{}: id is not a valid UUID", i + 1),
                            ));
                        }
                    }
                }
                Some(_) => {}
            }
        }
        Some(Protocol::Shadowsocks) => {
            let password = record
                .settings
                .get("password")
                .and_then(Value::as_str)
                .unwrap_or("");
            if password.is_empty() {
                issues.push(FieldIssue::error(
                    "password",
                    IssueCode::MissingRequired,
                    "shadowsocks inbound requires settings.password",
                ));
            }
        }
        _ => {}
    }

    issues
}

pub fn validate_outbound_record(record: &OutboundRecord) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    check_tag(&record.tag, &record.extra, &mut issues);

    // Everything below assumes a known settings shape.
    if mistyped(&record.extra, "protocol") {
        issues.push(wrong_type("protocol", "a string"));
        return issues;
    }
    let Some(protocol) = record.protocol_kind() else {
        issues.push(FieldIssue::error(
            "protocol",
            IssueCode::InvalidEnum,
            format!("unknown protocol {:?}", record.protocol),
        ));
        return issues;
    };

    if protocol.requires_server() {
        let ep = resolve_endpoint(protocol, &record.settings);
        if !ep.address.as_deref().is_some_and(is_valid_address) {
            issues.push(FieldIssue::error(
                "address",
                IssueCode::InvalidAddress,
                "server address must be an IP address or hostname",
            ));
        }
        if !port_ok(ep.port.as_ref()) {
            issues.push(FieldIssue::error(
                "port",
                IssueCode::InvalidPort,
                "server port must be an integer between 1 and 65535",
            ));
        }
    }

    if let Some(stream) = &record.stream_settings {
        if stream.security == Security::Reality {
            let reality = stream.reality_settings.as_ref();
            let has_key = reality
                .and_then(|r| r.public_key.as_deref())
                .is_some_and(|k| !k.trim().is_empty());
            if !has_key {
                issues.push(FieldIssue::error(
                    "reality",
                    IssueCode::RealityMissingKey,
                    "reality requires realitySettings.publicKey",
                ));
            }
            if let Some(sid) = reality.and_then(|r| r.short_id.as_deref()) {
                if sid.len() % 2 != 0 {
                    issues.push(FieldIssue::error(
                        "reality",
                        IssueCode::RealityShortId,
                        format!("shortId {sid:?} must have an even number of hex digits"),
                    ));
                }
            }
        }

        let conflict = match stream.security {
            Security::Tls => stream.reality_settings.is_some(),
            Security::Reality => stream.tls_settings.is_some(),
            _ => false,
        };
        if conflict {
            issues.push(FieldIssue::error(
                "security",
                IssueCode::Conflict,
                format!(
                    "security is {:?} but the settings block of the other mode is present",
                    stream.security.as_str()
                ),
            ));
        }
    } else if mistyped_non_null(&record.extra, "streamSettings") {
        issues.push(wrong_type("streamSettings", "an object"));
    }

    issues
}

pub fn validate_balancer_record(balancer: &Balancer) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    check_tag(&balancer.tag, &balancer.extra, &mut issues);
    if mistyped_non_null(&balancer.extra, "selector") {
        issues.push(FieldIssue::fatal(
            "selector",
            IssueCode::InvalidType,
            "selector must be a non-empty array of strings: \
             the proxy core crashes at startup on any other value",
        ));
    } else if balancer.selector.is_empty() {
        issues.push(FieldIssue::fatal(
            "selector",
            IssueCode::EmptySelector,
            "selector is empty: the proxy core crashes at startup on a balancer without selectors",
        ));
    }
    issues
}

/// Document-level checks for one routing rule: exactly one target, and the
/// target must name an existing outbound or balancer.
pub fn validate_routing_rule(
    rule: &RoutingRule,
    outbounds: &[OutboundRecord],
    balancers: &[Balancer],
) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    for key in ["outboundTag", "balancerTag"] {
        if mistyped_non_null(&rule.extra, key) {
            issues.push(wrong_type(key, "a string"));
        }
    }
    let ob = rule.outbound_tag.as_deref().filter(|s| !s.is_empty());
    let bl = rule.balancer_tag.as_deref().filter(|s| !s.is_empty());
    match (ob, bl) {
        (Some(_), Some(_)) => issues.push(FieldIssue::error(
            "target",
            IssueCode::Conflict,
            "rule sets both outboundTag and balancerTag",
        )),
        (None, None) => issues.push(FieldIssue::error(
            "target",
            IssueCode::MissingRequired,
            "rule needs an outboundTag or a balancerTag",
        )),
        _ => {}
    }
    if let Some(tag) = ob {
        if !outbounds.iter().any(|o| o.tag == tag) {
            issues.push(FieldIssue::error(
                "outboundTag",
                IssueCode::UnknownReference,
                format!("no outbound tagged {tag:?}"),
            ));
        }
    }
    if let Some(tag) = bl {
        if !balancers.iter().any(|b| b.tag == tag) {
            issues.push(FieldIssue::error(
                "balancerTag",
                IssueCode::UnknownReference,
                format!("no balancer tagged {tag:?}"),
            ));
        }
    }
    issues
}
