//! Settings layouts for outbounds that dial a remote server.
//!
//! Different tool versions wrote the server endpoint in three shapes:
//!
//! ```text
//! vnext:   {"vnext":   [{"address", "port", "users": [{"id", ...}]}]}
//! servers: {"servers": [{"address", "port", "password", ...}]}
//! flat:    {"address", "port", "id" | "password", ...}
//! ```
//!
//! [`ServerLayout::detect`] picks the layout (vnext first, then servers, then
//! flat) and [`ServerLayout::endpoint`] normalizes it to one [`Endpoint`].
//! The tolerance for several layouts is confined to this module.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient::Fields;
use crate::model::{PortValue, Protocol};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct UserEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// socks / http username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,
    /// vmess cipher (`auto`, `aes-128-gcm`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(rename = "alterId", skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for UserEntry {
    fn from(map: Map<String, Value>) -> Self {
        let mut f = Fields::new(map);
        Self {
            id: f.take("id"),
            password: f.take("password"),
            user: f.take("user"),
            pass: f.take("pass"),
            flow: f.take("flow"),
            encryption: f.take("encryption"),
            security: f.take("security"),
            alter_id: f.value("alterId"),
            extra: f.rest(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct VnextServer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for VnextServer {
    fn from(map: Map<String, Value>) -> Self {
        let mut f = Fields::new(map);
        Self {
            address: f.take("address"),
            port: f.take("port"),
            users: f.list("users"),
            extra: f.rest(),
        }
    }
}

/// One `servers[]` entry; also the shape of a flat `settings` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ServerEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// shadowsocks cipher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for ServerEntry {
    fn from(map: Map<String, Value>) -> Self {
        let mut f = Fields::new(map);
        Self {
            address: f.take("address"),
            port: f.take("port"),
            id: f.take("id"),
            password: f.take("password"),
            method: f.take("method"),
            flow: f.take("flow"),
            encryption: f.take("encryption"),
            users: f.list("users"),
            extra: f.rest(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerLayout {
    Vnext(VnextServer),
    Servers(ServerEntry),
    Flat(ServerEntry),
}

/// Canonical view of a remote endpoint, whatever layout it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Endpoint {
    pub address: Option<String>,
    pub port: Option<PortValue>,
    /// UUID for vless/vmess, password for trojan/shadowsocks, username for socks/http.
    pub credential: Option<String>,
    pub method: Option<String>,
    pub flow: Option<String>,
    pub encryption: Option<String>,
    /// vmess cipher
    pub cipher: Option<String>,
}

impl Endpoint {
    pub fn port_u16(&self) -> Option<u16> {
        self.port.as_ref().and_then(PortValue::as_u16)
    }
}

fn first_entry<'a>(settings: &'a Value, key: &str) -> Option<&'a Value> {
    settings.get(key)?.as_array()?.first()
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ServerLayout {
    /// Locate the endpoint inside an outbound `settings` value.
    ///
    /// Entries are read field by field: a wrong-typed field is dropped on its
    /// own and its siblings still count. An entry that is not an object at
    /// all yields an empty entry; validators then report the missing fields.
    pub fn detect(settings: &Value) -> Self {
        if let Some(v) = first_entry(settings, "vnext") {
            return Self::Vnext(serde_json::from_value(v.clone()).unwrap_or_default());
        }
        if let Some(v) = first_entry(settings, "servers") {
            return Self::Servers(serde_json::from_value(v.clone()).unwrap_or_default());
        }
        if settings.is_object() {
            return Self::Flat(serde_json::from_value(settings.clone()).unwrap_or_default());
        }
        Self::Flat(ServerEntry::default())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Vnext(_) => "vnext",
            Self::Servers(_) => "servers",
            Self::Flat(_) => "flat",
        }
    }

    pub fn endpoint(&self, protocol: Protocol) -> Endpoint {
        match self {
            Self::Vnext(v) => {
                let user = v.users.first();
                Endpoint {
                    address: non_empty(&v.address),
                    port: v.port.clone(),
                    credential: user.and_then(|u| user_credential(protocol, u)),
                    method: None,
                    flow: user.and_then(|u| non_empty(&u.flow)),
                    encryption: user.and_then(|u| non_empty(&u.encryption)),
                    cipher: user.and_then(|u| non_empty(&u.security)),
                }
            }
            Self::Servers(e) | Self::Flat(e) => {
                let user = e.users.first();
                let credential = entry_credential(protocol, e)
                    .or_else(|| user.and_then(|u| user_credential(protocol, u)));
                Endpoint {
                    address: non_empty(&e.address),
                    port: e.port.clone(),
                    credential,
                    method: non_empty(&e.method),
                    flow: non_empty(&e.flow).or_else(|| user.and_then(|u| non_empty(&u.flow))),
                    encryption: non_empty(&e.encryption)
                        .or_else(|| user.and_then(|u| non_empty(&u.encryption))),
                    cipher: user.and_then(|u| non_empty(&u.security)),
                }
            }
        }
    }
}

fn user_credential(protocol: Protocol, u: &UserEntry) -> Option<String> {
    match protocol {
        Protocol::Vless | Protocol::Vmess => non_empty(&u.id),
        Protocol::Trojan | Protocol::Shadowsocks => non_empty(&u.password),
        Protocol::Socks | Protocol::Http => non_empty(&u.user),
        _ => None,
    }
}

fn entry_credential(protocol: Protocol, e: &ServerEntry) -> Option<String> {
    match protocol {
        Protocol::Vless | Protocol::Vmess => non_empty(&e.id),
        Protocol::Trojan | Protocol::Shadowsocks => non_empty(&e.password),
        _ => None,
    }
}

/// Resolve the endpoint of an outbound's `settings` for `protocol`.
pub fn resolve_endpoint(protocol: Protocol, settings: &Value) -> Endpoint {
    ServerLayout::detect(settings).endpoint(protocol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vnext_layout() {
        let s = json!({"vnext": [{"address": "a.example", "port": 443,
            "users": [{"id": "550e8400-e29b-41d4-a716-446655440000",
                "flow": "xtls-rprx-vision"}]}]});
        let layout = ServerLayout::detect(&s);
        assert_eq!(layout.kind(), "vnext");
        let ep = layout.endpoint(Protocol::Vless);
        assert_eq!(ep.address.as_deref(), Some("a.example"));
        assert_eq!(ep.port_u16(), Some(443));
        assert_eq!(
            ep.credential.as_deref(),
            Some("550e8400-e29b-41d4-a716-446655440000")
        );
        assert_eq!(ep.flow.as_deref(), Some("xtls-rprx-vision"));
    }

    #[test]
    fn servers_layout_with_string_port() {
        let s = json!({"servers": [{"address": "1.2.3.4", "port": "8388",
            "method": "aes-256-gcm", "password": "secret"}]});
        let ep = resolve_endpoint(Protocol::Shadowsocks, &s);
        assert_eq!(ep.port_u16(), Some(8388));
        assert_eq!(ep.credential.as_deref(), Some("secret"));
        assert_eq!(ep.method.as_deref(), Some("aes-256-gcm"));
    }

    #[test]
    fn flat_layout() {
        let s = json!({"address": "h.example", "port": 443, "password": "pw"});
        let layout = ServerLayout::detect(&s);
        assert_eq!(layout.kind(), "flat");
        let ep = layout.endpoint(Protocol::Trojan);
        assert_eq!(ep.address.as_deref(), Some("h.example"));
        assert_eq!(ep.credential.as_deref(), Some("pw"));
    }

    #[test]
    fn socks_servers_users() {
        let s = json!({"servers": [{"address": "10.0.0.1", "port": 1080,
            "users": [{"user": "u", "pass": "p"}]}]});
        let ep = resolve_endpoint(Protocol::Socks, &s);
        assert_eq!(ep.credential.as_deref(), Some("u"));
    }

    #[test]
    fn malformed_entry_degrades_to_empty() {
        let s = json!({"vnext": [{"address": 5, "port": 443}]});
        let ep = resolve_endpoint(Protocol::Vless, &s);
        assert_eq!(ep.address, None);
        assert_eq!(ep.port_u16(), Some(443));
        let ep = resolve_endpoint(Protocol::Vless, &json!({"vnext": ["a.example:443"]}));
        assert_eq!(ep, Endpoint::default());
        let ep = resolve_endpoint(Protocol::Vless, &Value::Null);
        assert!(ep.address.is_none() && ep.port.is_none());
    }

    #[test]
    fn wrong_typed_sibling_keeps_address_and_port() {
        let s = json!({"vnext": [{"address": "a.example", "port": 443,
            "users": [{"id": "550e8400-e29b-41d4-a716-446655440000", "encryption": 0}]}]});
        let ep = resolve_endpoint(Protocol::Vless, &s);
        assert_eq!(ep.address.as_deref(), Some("a.example"));
        assert_eq!(ep.port_u16(), Some(443));
        assert_eq!(
            ep.credential.as_deref(),
            Some("550e8400-e29b-41d4-a716-446655440000")
        );
        assert_eq!(ep.encryption, None);

        let s = json!({"servers": [{"address": "1.2.3.4", "port": 8388,
            "password": "pw", "method": null, "level": "x"}]});
        let ep = resolve_endpoint(Protocol::Shadowsocks, &s);
        assert_eq!(ep.address.as_deref(), Some("1.2.3.4"));
        assert_eq!(ep.credential.as_deref(), Some("pw"));
    }

    #[test]
    fn empty_vnext_falls_through_to_servers() {
        let s = json!({"vnext": [], "servers": [{"address": "x.example", "port": 1}]});
        assert_eq!(ServerLayout::detect(&s).kind(), "servers");
    }
}
