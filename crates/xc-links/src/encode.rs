//! Outbound record -> share link.

use url::form_urlencoded::Serializer;

use xc_config::layout::{resolve_endpoint, Endpoint};
use xc_config::model::{Network, OutboundRecord, Protocol, Security, StreamSettings};

use crate::{b64, vmess, LinkError};

/// Transport and security parameters flattened to link form.
#[derive(Debug, Default)]
pub(crate) struct TransportParams {
    pub network: String,
    pub security: Option<String>,
    pub sni: Option<String>,
    pub fp: Option<String>,
    pub alpn: Option<String>,
    pub pbk: Option<String>,
    pub sid: Option<String>,
    pub spx: Option<String>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub service_name: Option<String>,
    pub mode: Option<String>,
}

fn owned(s: &Option<String>) -> Option<String> {
    s.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

fn joined(v: &[String]) -> Option<String> {
    (!v.is_empty()).then(|| v.join(","))
}

pub(crate) fn transport_params(ss: Option<&StreamSettings>) -> TransportParams {
    let Some(ss) = ss else {
        return TransportParams {
            network: Network::Tcp.as_str().to_string(),
            ..Default::default()
        };
    };
    let mut p = TransportParams {
        network: ss.network.as_str().to_string(),
        ..Default::default()
    };
    match &ss.security {
        Security::None => {}
        Security::Tls => {
            p.security = Some("tls".into());
            if let Some(tls) = &ss.tls_settings {
                p.sni = owned(&tls.server_name);
                p.fp = owned(&tls.fingerprint);
                p.alpn = joined(&tls.alpn);
            }
        }
        Security::Reality => {
            p.security = Some("reality".into());
            if let Some(r) = &ss.reality_settings {
                p.sni = owned(&r.server_name);
                p.fp = owned(&r.fingerprint);
                p.alpn = joined(&r.alpn);
                p.pbk = owned(&r.public_key);
                p.sid = owned(&r.short_id);
                p.spx = owned(&r.spider_x);
            }
        }
        Security::Other(s) => p.security = Some(s.clone()),
    }
    match ss.network {
        Network::Ws => {
            if let Some(ws) = &ss.ws_settings {
                p.path = owned(&ws.path);
                p.host = ws.host_header().filter(|h| !h.is_empty()).map(str::to_string);
            }
        }
        Network::Grpc => {
            if let Some(g) = &ss.grpc_settings {
                p.service_name = owned(&g.service_name);
            }
        }
        Network::Xhttp => {
            if let Some(x) = &ss.xhttp_settings {
                p.path = owned(&x.path);
                p.host = owned(&x.host);
                p.mode = owned(&x.mode);
            }
        }
        _ => {}
    }
    p
}

fn host_for_url(address: &str) -> String {
    if address.contains(':') && !address.starts_with('[') {
        format!("[{address}]")
    } else {
        address.to_string()
    }
}

fn fragment(tag: &str) -> String {
    if tag.is_empty() {
        String::new()
    } else {
        format!("#{}", urlencoding::encode(tag))
    }
}

fn query_link(
    scheme: &str,
    record: &OutboundRecord,
    ep: &Endpoint,
    address: &str,
    port: u16,
    credential: &str,
) -> String {
    let t = transport_params(record.stream_settings.as_ref());
    let mut q = Serializer::new(String::new());
    q.append_pair("type", &t.network);
    if scheme == "vless" {
        q.append_pair("encryption", ep.encryption.as_deref().unwrap_or("none"));
    }
    let optional = [
        ("flow", ep.flow.as_ref()),
        ("security", t.security.as_ref()),
        ("sni", t.sni.as_ref()),
        ("fp", t.fp.as_ref()),
        ("alpn", t.alpn.as_ref()),
        ("pbk", t.pbk.as_ref()),
        ("sid", t.sid.as_ref()),
        ("spx", t.spx.as_ref()),
        ("path", t.path.as_ref()),
        ("host", t.host.as_ref()),
        ("serviceName", t.service_name.as_ref()),
        ("mode", t.mode.as_ref()),
    ];
    for (key, value) in optional {
        if let Some(v) = value {
            q.append_pair(key, v);
        }
    }
    format!(
        "{scheme}://{}@{}:{port}?{}{}",
        urlencoding::encode(credential),
        host_for_url(address),
        q.finish(),
        fragment(&record.tag)
    )
}

/// Encode one record, reporting why it is not exportable.
pub fn try_encode_link(record: &OutboundRecord) -> Result<String, LinkError> {
    let protocol = record
        .protocol_kind()
        .ok_or_else(|| LinkError::NotExportable(record.protocol.clone()))?;
    if !matches!(
        protocol,
        Protocol::Vless | Protocol::Vmess | Protocol::Trojan | Protocol::Shadowsocks
    ) {
        return Err(LinkError::NotExportable(record.protocol.clone()));
    }

    let ep = resolve_endpoint(protocol, &record.settings);
    let address = ep.address.as_deref().ok_or(LinkError::MissingField("address"))?;
    let port = ep.port_u16().ok_or(LinkError::MissingField("port"))?;
    let credential = ep
        .credential
        .as_deref()
        .ok_or(LinkError::MissingField("credential"))?;

    match protocol {
        Protocol::Vless => Ok(query_link("vless", record, &ep, address, port, credential)),
        Protocol::Trojan => Ok(query_link("trojan", record, &ep, address, port, credential)),
        Protocol::Vmess => vmess::encode(record, &ep, address, port, credential),
        _ => {
            let method = ep.method.as_deref().ok_or(LinkError::MissingField("method"))?;
            Ok(format!(
                "ss://{}@{}:{port}{}",
                b64::encode_url_safe(format!("{method}:{credential}").as_bytes()),
                host_for_url(address),
                fragment(&record.tag)
            ))
        }
    }
}

/// Encode one record; `""` means "not exportable, omit it".
pub fn encode_link(record: &OutboundRecord) -> String {
    try_encode_link(record).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ob(v: serde_json::Value) -> OutboundRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn vless_reality_link() {
        let r = ob(json!({
            "tag": "hk 01",
            "protocol": "vless",
            "settings": {"vnext": [{"address": "hk.example", "port": 443,
                "users": [{"id": "550e8400-e29b-41d4-a716-446655440000",
                    "flow": "xtls-rprx-vision", "encryption": "none"}]}]},
            "streamSettings": {"network": "tcp", "security": "reality",
                "realitySettings": {"serverName": "www.microsoft.com", "fingerprint": "chrome",
                    "publicKey": "PBK", "shortId": "6ba85179e30d4fc2", "spiderX": "/"}}
        }));
        assert_eq!(
            encode_link(&r),
            "vless://550e8400-e29b-41d4-a716-446655440000@hk.example:443?type=tcp&encryption=none\
             &flow=xtls-rprx-vision&security=reality&sni=www.microsoft.com&fp=chrome&pbk=PBK\
             &sid=6ba85179e30d4fc2&spx=%2F#hk%2001"
        );
    }

    #[test]
    fn trojan_ws_flat_layout_and_ipv6() {
        let r = ob(json!({
            "tag": "t",
            "protocol": "trojan",
            "settings": {"address": "2001:db8::1", "port": "8443", "password": "p@ss"},
            "streamSettings": {"network": "ws", "security": "tls",
                "tlsSettings": {"serverName": "t.example", "alpn": ["h2", "http/1.1"]},
                "wsSettings": {"path": "/ray", "headers": {"Host": "cdn.example"}}}
        }));
        assert_eq!(
            encode_link(&r),
            "trojan://p%40ss@[2001:db8::1]:8443?type=ws&security=tls&sni=t.example\
             &alpn=h2%2Chttp%2F1.1&path=%2Fray&host=cdn.example#t"
        );
    }

    #[test]
    fn shadowsocks_link() {
        let r = ob(json!({
            "tag": "TestNode",
            "protocol": "shadowsocks",
            "settings": {"servers": [{"address": "1.2.3.4", "port": 8388,
                "method": "aes-256-gcm", "password": "test"}]}
        }));
        assert_eq!(
            encode_link(&r),
            "ss://YWVzLTI1Ni1nY206dGVzdA@1.2.3.4:8388#TestNode"
        );
    }

    #[test]
    fn incomplete_or_unsupported_records_encode_to_empty() {
        let no_port = ob(json!({"tag": "a", "protocol": "trojan",
            "settings": {"servers": [{"address": "h.example", "password": "p"}]}}));
        assert_eq!(encode_link(&no_port), "");
        assert_eq!(
            try_encode_link(&no_port),
            Err(LinkError::MissingField("port"))
        );

        let no_method = ob(json!({"tag": "s", "protocol": "shadowsocks",
            "settings": {"servers": [{"address": "h.example", "port": 1, "password": "p"}]}}));
        assert_eq!(
            try_encode_link(&no_method),
            Err(LinkError::MissingField("method"))
        );

        let direct = ob(json!({"tag": "direct", "protocol": "freedom"}));
        assert!(matches!(
            try_encode_link(&direct),
            Err(LinkError::NotExportable(p)) if p == "freedom"
        ));
        assert_eq!(encode_link(&OutboundRecord::default()), "");
    }
}
