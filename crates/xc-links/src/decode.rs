//! Share link -> outbound record.

use rand::Rng;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::warn;
use url::{Host, Url};

use xc_config::model::{
    GrpcSettings, Network, OutboundRecord, RealitySettings, Security, StreamSettings,
    TlsSettings, WsSettings, XhttpSettings,
};

use crate::{b64, vmess, LinkError};

/// Query parameters of a link, flattened (last occurrence wins).
pub(crate) type Query = HashMap<String, String>;

/// Pieces of a `scheme://userinfo@host:port?query#fragment` link.
#[derive(Debug)]
pub(crate) struct LinkParts {
    pub userinfo: String,
    pub host: String,
    pub port: Option<u16>,
    pub query: Query,
    pub label: Option<String>,
}

fn percent_decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

pub(crate) fn split_link(link: &str) -> Result<LinkParts, LinkError> {
    let url = Url::parse(link).map_err(|e| LinkError::Malformed(e.to_string()))?;
    let host = match url.host() {
        Some(Host::Domain(d)) => percent_decode(d),
        Some(Host::Ipv4(a)) => a.to_string(),
        Some(Host::Ipv6(a)) => a.to_string(),
        None => return Err(LinkError::MissingHost),
    };
    if host.is_empty() {
        return Err(LinkError::MissingHost);
    }
    let mut userinfo = percent_decode(url.username());
    if let Some(pw) = url.password() {
        userinfo.push(':');
        userinfo.push_str(&percent_decode(pw));
    }
    let query = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let label = url
        .fragment()
        .map(percent_decode)
        .filter(|s| !s.trim().is_empty());
    Ok(LinkParts {
        userinfo,
        host,
        port: url.port(),
        query,
        label,
    })
}

/// Non-empty query value.
pub(crate) fn param<'a>(q: &'a Query, key: &str) -> Option<&'a str> {
    q.get(key).map(String::as_str).filter(|s| !s.is_empty())
}

pub(crate) fn synthesize_label(protocol: &str) -> String {
    format!("{}-{}", protocol, rand::thread_rng().gen_range(100..1000))
}

fn split_alpn(q: &Query) -> Vec<String> {
    param(q, "alpn")
        .map(|a| {
            a.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Transport + security from link parameters. `host` is the SNI fallback.
pub(crate) fn stream_from_query(q: &Query, host: &str) -> StreamSettings {
    let network = Network::from(
        param(q, "type")
            .or_else(|| param(q, "net"))
            .unwrap_or("tcp"),
    );
    let security = Security::from(param(q, "security").unwrap_or("none"));
    let sni = param(q, "sni").unwrap_or(host).to_string();
    let fingerprint = param(q, "fp").unwrap_or("chrome").to_string();

    let mut ss = StreamSettings {
        network,
        ..Default::default()
    };
    match security {
        Security::Tls => {
            ss.tls_settings = Some(TlsSettings {
                server_name: Some(sni),
                fingerprint: Some(fingerprint),
                alpn: split_alpn(q),
                ..Default::default()
            });
        }
        Security::Reality => {
            ss.reality_settings = Some(RealitySettings {
                server_name: Some(sni),
                fingerprint: Some(fingerprint),
                public_key: param(q, "pbk").map(str::to_string),
                short_id: param(q, "sid").map(str::to_string),
                spider_x: Some(param(q, "spx").unwrap_or("/").to_string()),
                alpn: split_alpn(q),
                ..Default::default()
            });
        }
        _ => {}
    }
    ss.security = security;

    match ss.network {
        Network::Ws => {
            let mut ws = WsSettings {
                path: Some(param(q, "path").unwrap_or("/").to_string()),
                ..Default::default()
            };
            if let Some(h) = param(q, "host") {
                ws.headers.insert("Host".to_string(), h.to_string());
            }
            ss.ws_settings = Some(ws);
        }
        Network::Grpc => {
            ss.grpc_settings = Some(GrpcSettings {
                service_name: param(q, "serviceName").map(str::to_string),
                ..Default::default()
            });
        }
        Network::Xhttp => {
            ss.xhttp_settings = Some(XhttpSettings {
                path: Some(param(q, "path").unwrap_or("/").to_string()),
                host: param(q, "host").map(str::to_string),
                mode: param(q, "mode").map(str::to_string),
                ..Default::default()
            });
        }
        _ => {}
    }
    ss
}

fn record(
    protocol: &str,
    label: Option<String>,
    settings: Value,
    stream: StreamSettings,
) -> OutboundRecord {
    OutboundRecord {
        tag: label.unwrap_or_else(|| synthesize_label(protocol)),
        protocol: protocol.to_string(),
        settings,
        stream_settings: Some(stream),
        extra: Map::new(),
    }
}

fn parse_vless(link: &str) -> Result<OutboundRecord, LinkError> {
    let p = split_link(link)?;
    if p.userinfo.is_empty() {
        return Err(LinkError::MissingCredential);
    }
    let settings = json!({
        "vnext": [{
            "address": p.host,
            "port": p.port.unwrap_or(443),
            "users": [{
                "id": p.userinfo,
                "flow": param(&p.query, "flow").unwrap_or(""),
                "encryption": param(&p.query, "encryption").unwrap_or("none"),
            }],
        }]
    });
    let stream = stream_from_query(&p.query, &p.host);
    Ok(record("vless", p.label, settings, stream))
}

fn parse_trojan(link: &str) -> Result<OutboundRecord, LinkError> {
    let p = split_link(link)?;
    if p.userinfo.is_empty() {
        return Err(LinkError::MissingCredential);
    }
    let mut server = json!({
        "address": p.host,
        "port": p.port.unwrap_or(443),
        "password": p.userinfo,
    });
    if let Some(flow) = param(&p.query, "flow") {
        server["flow"] = json!(flow);
    }
    let stream = stream_from_query(&p.query, &p.host);
    Ok(record("trojan", p.label, json!({ "servers": [server] }), stream))
}

/// `method:password` from a SIP002 userinfo segment.
///
/// Base64 (URL-safe, un-padded) is expected. When it does not decode to a
/// `method:password` text the segment is taken as plaintext, which accepts
/// non-standard links at the cost of also accepting some malformed ones.
fn shadowsocks_userinfo(raw: &str) -> Result<(String, String), LinkError> {
    let raw = percent_decode(raw);
    let plain = match b64::decode_text(&raw) {
        Some(text) if text.contains(':') => text,
        _ => {
            warn!("shadowsocks userinfo is not base64, reading it as plaintext method:password");
            raw
        }
    };
    let (method, password) = plain
        .split_once(':')
        .ok_or(LinkError::MissingCredential)?;
    if method.is_empty() || password.is_empty() {
        return Err(LinkError::MissingCredential);
    }
    Ok((method.to_string(), password.to_string()))
}

fn parse_shadowsocks(link: &str) -> Result<OutboundRecord, LinkError> {
    let body = link
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(|| LinkError::Malformed("missing scheme separator".into()))?;
    let (body, fragment) = match body.split_once('#') {
        Some((b, f)) => (b, Some(f)),
        None => (body, None),
    };
    let (authority, query) = match body.split_once('?') {
        Some((a, q)) => (a, Some(q)),
        None => (body, None),
    };

    let (method, password, hostport) = match authority.rsplit_once('@') {
        Some((userinfo, hostport)) => {
            let (m, p) = shadowsocks_userinfo(userinfo)?;
            (m, p, hostport.to_string())
        }
        None => {
            // legacy: ss://base64(method:password@host:port)
            let decoded = b64::decode_text(authority.trim_end_matches('/'))
                .ok_or_else(|| LinkError::Malformed("shadowsocks body is not base64".into()))?;
            let (userinfo, hostport) = decoded
                .rsplit_once('@')
                .ok_or(LinkError::MissingHost)?;
            let (m, p) = userinfo
                .split_once(':')
                .ok_or(LinkError::MissingCredential)?;
            (m.to_string(), p.to_string(), hostport.to_string())
        }
    };

    let mut rebuilt = format!("ss://{hostport}");
    if let Some(q) = query {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    if let Some(f) = fragment {
        rebuilt.push('#');
        rebuilt.push_str(f);
    }
    let p = split_link(&rebuilt)?;

    let mut server = Map::new();
    server.insert("address".into(), json!(p.host));
    if let Some(port) = p.port {
        server.insert("port".into(), json!(port));
    }
    server.insert("method".into(), json!(method));
    server.insert("password".into(), json!(password));

    let stream = stream_from_query(&p.query, &p.host);
    Ok(record(
        "shadowsocks",
        p.label,
        json!({ "servers": [Value::Object(server)] }),
        stream,
    ))
}

/// Decode one share link, reporting why it failed.
pub fn parse_link(link: &str) -> Result<OutboundRecord, LinkError> {
    let link = link.trim();
    let (scheme, _) = link
        .split_once("://")
        .ok_or_else(|| LinkError::Malformed("missing scheme separator".into()))?;
    match scheme.to_ascii_lowercase().as_str() {
        "vless" => parse_vless(link),
        "trojan" => parse_trojan(link),
        "ss" => parse_shadowsocks(link),
        "vmess" => vmess::parse(link),
        other => Err(LinkError::UnsupportedScheme(other.to_string())),
    }
}

/// Decode one share link; `None` means "skip this line".
pub fn decode_link(link: &str) -> Option<OutboundRecord> {
    parse_link(link).ok()
}
