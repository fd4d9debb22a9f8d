//! Document model for Xray-style JSON configurations.
//! Xray 风格 JSON 配置的文档模型。
//!
//! Import only requires a well-formed JSON object; semantic invariants live
//! in [`crate::validator`]. Unknown keys are carried through `extra` maps so
//! export keeps sections the editor does not model (dns, log, api, policy,
//! reverse, observatory).
//!
//! Records are read field by field. A known key holding a value of the wrong
//! type (`"tag": null`, `"protocol": 5`, `"selector": "proxy-"`) leaves the
//! typed field at its default and stays in `extra` under its own key, where
//! the validators find and report it. Fields that default to empty are
//! skipped on export so such a key is never written twice.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::lenient::Fields;
use crate::DocumentError;

/// Closed set of protocols the editor knows how to reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Vless,
    Vmess,
    Trojan,
    Shadowsocks,
    Socks,
    Http,
    Freedom,
    Blackhole,
    Dns,
    Wireguard,
    #[serde(rename = "dokodemo-door")]
    DokodemoDoor,
    Tun,
    Loopback,
}

impl Protocol {
    pub const ALL: [Protocol; 13] = [
        Protocol::Vless,
        Protocol::Vmess,
        Protocol::Trojan,
        Protocol::Shadowsocks,
        Protocol::Socks,
        Protocol::Http,
        Protocol::Freedom,
        Protocol::Blackhole,
        Protocol::Dns,
        Protocol::Wireguard,
        Protocol::DokodemoDoor,
        Protocol::Tun,
        Protocol::Loopback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vless => "vless",
            Self::Vmess => "vmess",
            Self::Trojan => "trojan",
            Self::Shadowsocks => "shadowsocks",
            Self::Socks => "socks",
            Self::Http => "http",
            Self::Freedom => "freedom",
            Self::Blackhole => "blackhole",
            Self::Dns => "dns",
            Self::Wireguard => "wireguard",
            Self::DokodemoDoor => "dokodemo-door",
            Self::Tun => "tun",
            Self::Loopback => "loopback",
        }
    }

    /// Protocols whose outbound dials a remote server (address + port).
    pub fn requires_server(&self) -> bool {
        matches!(
            self,
            Self::Vless | Self::Vmess | Self::Trojan | Self::Shadowsocks | Self::Socks | Self::Http
        )
    }

    /// Protocols whose credential is a UUID rather than a free-form password.
    pub fn uses_uuid(&self) -> bool {
        matches!(self, Self::Vless | Self::Vmess)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol: {0:?}")]
pub struct UnknownProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownProtocol(s.to_string()))
    }
}

/// A port as it appears in the document: a number, a string ("443", "1000-2000")
/// or whatever else a hand-edited file contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(i64),
    Text(String),
    Other(Value),
}

impl PortValue {
    /// Stringified form, used by the port predicate.
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Other(v) => v.to_string(),
        }
    }

    /// The port as a number, when it is a single valid port.
    pub fn as_u16(&self) -> Option<u16> {
        let text = self.as_text();
        if crate::address::is_valid_port(&text) {
            text.trim().parse().ok()
        } else {
            None
        }
    }
}

impl From<u16> for PortValue {
    fn from(p: u16) -> Self {
        Self::Number(i64::from(p))
    }
}

/// Aggregate root: the whole configuration being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Document {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inbounds: Vec<InboundRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outbounds: Vec<OutboundRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<Routing>,
    /// dns, log, api, policy, reverse, observatory, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        let mut f = Fields::new(map);
        Self {
            inbounds: f.list("inbounds"),
            outbounds: f.list("outbounds"),
            routing: f.take("routing"),
            extra: f.rest(),
        }
    }
}

impl Document {
    /// Parse a JSON text blob. Only well-formedness and an object at the top
    /// level are enforced here.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Pretty-printed JSON; identical documents always produce identical text.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Serialize)
    }

    pub fn rules(&self) -> &[RoutingRule] {
        match &self.routing {
            Some(r) => &r.rules,
            None => &[],
        }
    }

    pub fn balancers(&self) -> &[Balancer] {
        match &self.routing {
            Some(r) => &r.balancers,
            None => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct InboundRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub settings: Value,
    #[serde(rename = "streamSettings", skip_serializing_if = "Option::is_none")]
    pub stream_settings: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for InboundRecord {
    fn from(map: Map<String, Value>) -> Self {
        let mut f = Fields::new(map);
        Self {
            tag: f.text("tag"),
            protocol: f.text("protocol"),
            listen: f.take("listen"),
            port: f.take("port"),
            settings: f.value("settings").unwrap_or(Value::Null),
            stream_settings: f.value("streamSettings"),
            extra: f.rest(),
        }
    }
}

impl InboundRecord {
    pub fn protocol_kind(&self) -> Option<Protocol> {
        self.protocol.parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct OutboundRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    /// Protocol-dependent; see [`crate::layout::ServerLayout`] for how the
    /// remote endpoint is located inside it.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub settings: Value,
    #[serde(rename = "streamSettings", skip_serializing_if = "Option::is_none")]
    pub stream_settings: Option<StreamSettings>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for OutboundRecord {
    fn from(map: Map<String, Value>) -> Self {
        let mut f = Fields::new(map);
        Self {
            tag: f.text("tag"),
            protocol: f.text("protocol"),
            settings: f.value("settings").unwrap_or(Value::Null),
            stream_settings: f.take("streamSettings"),
            extra: f.rest(),
        }
    }
}

impl OutboundRecord {
    pub fn protocol_kind(&self) -> Option<Protocol> {
        self.protocol.parse().ok()
    }
}

/// Transport network of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Network {
    #[default]
    Tcp,
    Ws,
    Grpc,
    Http,
    Quic,
    Kcp,
    Xhttp,
    /// Values this editor does not model (`raw`, `httpupgrade`, ...); kept verbatim.
    Other(String),
}

impl Network {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tcp => "tcp",
            Self::Ws => "ws",
            Self::Grpc => "grpc",
            Self::Http => "http",
            Self::Quic => "quic",
            Self::Kcp => "kcp",
            Self::Xhttp => "xhttp",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Network {
    fn from(s: String) -> Self {
        match s.as_str() {
            "tcp" => Self::Tcp,
            "ws" => Self::Ws,
            "grpc" => Self::Grpc,
            "http" => Self::Http,
            "quic" => Self::Quic,
            "kcp" => Self::Kcp,
            "xhttp" => Self::Xhttp,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Network {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Network> for String {
    fn from(n: Network) -> Self {
        n.as_str().to_string()
    }
}

/// Transport-layer security mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Security {
    #[default]
    None,
    Tls,
    Reality,
    Other(String),
}

impl Security {
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Tls => "tls",
            Self::Reality => "reality",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Security {
    fn from(s: String) -> Self {
        match s.as_str() {
            "none" | "" => Self::None,
            "tls" => Self::Tls,
            "reality" => Self::Reality,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Security {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Security> for String {
    fn from(s: Security) -> Self {
        s.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub security: Security,
    #[serde(rename = "tlsSettings", default, skip_serializing_if = "Option::is_none")]
    pub tls_settings: Option<TlsSettings>,
    #[serde(
        rename = "realitySettings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reality_settings: Option<RealitySettings>,
    #[serde(rename = "wsSettings", default, skip_serializing_if = "Option::is_none")]
    pub ws_settings: Option<WsSettings>,
    #[serde(rename = "grpcSettings", default, skip_serializing_if = "Option::is_none")]
    pub grpc_settings: Option<GrpcSettings>,
    #[serde(
        rename = "xhttpSettings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub xhttp_settings: Option<XhttpSettings>,
    #[serde(rename = "kcpSettings", default, skip_serializing_if = "Option::is_none")]
    pub kcp_settings: Option<Value>,
    #[serde(rename = "quicSettings", default, skip_serializing_if = "Option::is_none")]
    pub quic_settings: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sockopt: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamSettings {
    /// Switch security mode, dropping the settings block of the other mode so
    /// `tlsSettings` and `realitySettings` never coexist.
    pub fn set_security(&mut self, security: Security) {
        match security {
            Security::Tls => self.reality_settings = None,
            Security::Reality => self.tls_settings = None,
            _ => {
                self.tls_settings = None;
                self.reality_settings = None;
            }
        }
        self.security = security;
    }

    /// SNI of whichever security block is active.
    pub fn server_name(&self) -> Option<&str> {
        match self.security {
            Security::Tls => self.tls_settings.as_ref()?.server_name.as_deref(),
            Security::Reality => self.reality_settings.as_ref()?.server_name.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsSettings {
    #[serde(rename = "serverName", default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(
        rename = "allowInsecure",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allow_insecure: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealitySettings {
    #[serde(rename = "serverName", default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(rename = "publicKey", default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(rename = "shortId", default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    #[serde(rename = "spiderX", default, skip_serializing_if = "Option::is_none")]
    pub spider_x: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WsSettings {
    /// `Host` header, falling back to the newer top-level `host` field.
    pub fn host_header(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("host"))
            .map(|(_, v)| v.as_str())
            .or(self.host.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrpcSettings {
    #[serde(rename = "serviceName", default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(rename = "multiMode", default, skip_serializing_if = "Option::is_none")]
    pub multi_mode: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XhttpSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Routing {
    #[serde(rename = "domainStrategy", skip_serializing_if = "Option::is_none")]
    pub domain_strategy: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RoutingRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub balancers: Vec<Balancer>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for Routing {
    fn from(map: Map<String, Value>) -> Self {
        let mut f = Fields::new(map);
        Self {
            domain_strategy: f.take("domainStrategy"),
            rules: f.list("rules"),
            balancers: f.list("balancers"),
            extra: f.rest(),
        }
    }
}

/// One routing rule. Evaluated by the proxy engine in array order, first match wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RoutingRule {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<String>,
    #[serde(rename = "inboundTag", skip_serializing_if = "Vec::is_empty")]
    pub inbound_tag: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocol: Vec<String>,
    #[serde(rename = "outboundTag", skip_serializing_if = "Option::is_none")]
    pub outbound_tag: Option<String>,
    #[serde(rename = "balancerTag", skip_serializing_if = "Option::is_none")]
    pub balancer_tag: Option<String>,
    #[serde(rename = "ruleTag", skip_serializing_if = "Option::is_none")]
    pub rule_tag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for RoutingRule {
    fn from(map: Map<String, Value>) -> Self {
        let mut f = Fields::new(map);
        Self {
            kind: f.take("type"),
            domain: f.list("domain"),
            ip: f.list("ip"),
            port: f.take("port"),
            network: f.take("network"),
            source: f.list("source"),
            inbound_tag: f.list("inboundTag"),
            protocol: f.list("protocol"),
            outbound_tag: f.take("outboundTag"),
            balancer_tag: f.take("balancerTag"),
            rule_tag: f.take("ruleTag"),
            extra: f.rest(),
        }
    }
}

/// Where a rule sends matching traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget<'a> {
    Outbound(&'a str),
    Balancer(&'a str),
}

impl RoutingRule {
    /// The single target, or `None` when the rule has both or neither.
    pub fn target(&self) -> Option<RuleTarget<'_>> {
        let ob = self.outbound_tag.as_deref().filter(|s| !s.is_empty());
        let bl = self.balancer_tag.as_deref().filter(|s| !s.is_empty());
        match (ob, bl) {
            (Some(t), None) => Some(RuleTarget::Outbound(t)),
            (None, Some(t)) => Some(RuleTarget::Balancer(t)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Balancer {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    /// Prefix patterns matched against outbound tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selector: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<BalancerStrategy>,
    #[serde(rename = "fallbackTag", skip_serializing_if = "Option::is_none")]
    pub fallback_tag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for Balancer {
    fn from(map: Map<String, Value>) -> Self {
        let mut f = Fields::new(map);
        Self {
            tag: f.text("tag"),
            selector: f.list("selector"),
            strategy: f.take("strategy"),
            fallback_tag: f.take("fallbackTag"),
            extra: f.rest(),
        }
    }
}

impl Balancer {
    /// Whether `outbound_tag` is selected by any selector prefix.
    pub fn selects(&self, outbound_tag: &str) -> bool {
        self.selector
            .iter()
            .any(|prefix| !prefix.is_empty() && outbound_tag.starts_with(prefix.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalancerStrategy {
    #[serde(rename = "type", default)]
    pub kind: StrategyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StrategyKind {
    #[default]
    Random,
    RoundRobin,
    LeastPing,
    LeastLoad,
    Other(String),
}

impl StrategyKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Random => "random",
            Self::RoundRobin => "roundRobin",
            Self::LeastPing => "leastPing",
            Self::LeastLoad => "leastLoad",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for StrategyKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "random" => Self::Random,
            "roundRobin" => Self::RoundRobin,
            "leastPing" => Self::LeastPing,
            "leastLoad" => Self::LeastLoad,
            _ => Self::Other(s),
        }
    }
}

impl From<StrategyKind> for String {
    fn from(k: StrategyKind) -> Self {
        k.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn protocol_parse_is_closed() {
        assert_eq!("dokodemo-door".parse::<Protocol>(), Ok(Protocol::DokodemoDoor));
        assert_eq!("vless".parse::<Protocol>(), Ok(Protocol::Vless));
        assert!("reality-proxy".parse::<Protocol>().is_err());
        assert!("VLESS".parse::<Protocol>().is_err());
        for p in Protocol::ALL {
            assert_eq!(p.as_str().parse::<Protocol>(), Ok(p));
        }
    }

    #[test]
    fn unknown_sections_survive_roundtrip() -> anyhow::Result<()> {
        let text = r#"{
            "log": {"loglevel": "warning"},
            "inbounds": [{"tag": "in", "protocol": "socks", "port": 1080, "listen": "127.0.0.1"}],
            "outbounds": [{"tag": "direct", "protocol": "freedom"}],
            "routing": {"rules": [{"outboundTag": "direct", "port": "53,443"}]},
            "dns": {"servers": ["1.1.1.1"]}
        }"#;
        let doc = Document::from_json(text)?;
        assert_eq!(doc.extra.len(), 2);
        assert_eq!(
            doc.rules()[0].port,
            Some(PortValue::Text("53,443".to_string()))
        );
        let out = doc.to_json_pretty()?;
        let back = Document::from_json(&out)?;
        assert_eq!(back, doc);
        assert_eq!(back.to_json_pretty()?, out);
        Ok(())
    }

    #[test]
    fn wrong_typed_fields_load_and_write_back() -> anyhow::Result<()> {
        let text = r#"{
            "outbounds": [{"tag": null, "protocol": 5, "settings": {}}],
            "routing": {"balancers": [{"tag": "lb", "selector": "proxy-"}]}
        }"#;
        let doc = Document::from_json(text)?;
        let ob = &doc.outbounds[0];
        assert_eq!(ob.tag, "");
        assert_eq!(ob.protocol, "");
        assert_eq!(ob.extra.get("tag"), Some(&Value::Null));
        assert_eq!(ob.extra.get("protocol"), Some(&json!(5)));
        let lb = &doc.balancers()[0];
        assert!(lb.selector.is_empty());
        assert_eq!(lb.extra.get("selector"), Some(&json!("proxy-")));

        let v: Value = serde_json::from_str(&doc.to_json_pretty()?)?;
        assert_eq!(v["outbounds"][0]["tag"], Value::Null);
        assert_eq!(v["outbounds"][0]["protocol"], 5);
        assert_eq!(v["routing"]["balancers"][0]["selector"], "proxy-");
        Ok(())
    }

    #[test]
    fn top_level_must_be_an_object() {
        assert!(Document::from_json("[]").is_err());
        assert!(Document::from_json("{\"outbounds\": [").is_err());
    }

    #[test]
    fn network_and_security_keep_unmodelled_values() -> anyhow::Result<()> {
        let ss: StreamSettings =
            serde_json::from_value(json!({"network": "httpupgrade", "security": "tls"}))?;
        assert_eq!(ss.network, Network::Other("httpupgrade".into()));
        assert_eq!(ss.security, Security::Tls);
        let v = serde_json::to_value(&ss)?;
        assert_eq!(v["network"], "httpupgrade");
        Ok(())
    }

    #[test]
    fn set_security_clears_other_block() {
        let mut ss = StreamSettings {
            tls_settings: Some(TlsSettings::default()),
            ..Default::default()
        };
        ss.set_security(Security::Reality);
        assert!(ss.tls_settings.is_none());
        assert_eq!(ss.security, Security::Reality);
    }

    #[test]
    fn rule_target_requires_exactly_one() {
        let mut r = RoutingRule {
            outbound_tag: Some("direct".into()),
            ..Default::default()
        };
        assert_eq!(r.target(), Some(RuleTarget::Outbound("direct")));
        r.balancer_tag = Some("b".into());
        assert_eq!(r.target(), None);
        r.outbound_tag = None;
        assert_eq!(r.target(), Some(RuleTarget::Balancer("b")));
    }

    #[test]
    fn balancer_selector_is_prefix_match() {
        let b = Balancer {
            tag: "b".into(),
            selector: vec!["hk-".into(), "".into()],
            ..Default::default()
        };
        assert!(b.selects("hk-01"));
        assert!(!b.selects("jp-01"));
    }
}
