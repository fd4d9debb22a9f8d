//! `vmess://` carries base64 JSON instead of query parameters.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use xc_config::layout::Endpoint;
use xc_config::model::OutboundRecord;

use crate::decode::{stream_from_query, synthesize_label, Query};
use crate::encode::transport_params;
use crate::{b64, LinkError};

/// Wire shape of the vmess payload. Field order is the order clients emit.
///
/// Every field is a raw [`Value`]: generators write numbers, strings and
/// `null` interchangeably, so fields are read through [`value_text`].
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct VmessShare {
    v: Value,
    ps: Value,
    add: Value,
    port: Value,
    id: Value,
    aid: Value,
    scy: Value,
    net: Value,
    #[serde(rename = "type")]
    kind: Value,
    host: Value,
    path: Value,
    tls: Value,
    sni: Value,
    alpn: Value,
    fp: Value,
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn parse(link: &str) -> Result<OutboundRecord, LinkError> {
    let payload = link
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    let text = b64::decode_text(payload)
        .ok_or_else(|| LinkError::VmessPayload("not base64".into()))?;
    let share: VmessShare =
        serde_json::from_str(&text).map_err(|e| LinkError::VmessPayload(e.to_string()))?;

    let address = value_text(&share.add);
    if address.is_empty() {
        return Err(LinkError::MissingHost);
    }
    let id = value_text(&share.id);
    if id.is_empty() {
        return Err(LinkError::MissingCredential);
    }
    let port_text = value_text(&share.port);
    let port: u16 = if port_text.is_empty() {
        443
    } else {
        port_text
            .parse()
            .map_err(|_| LinkError::Malformed(format!("invalid port {port_text:?}")))?
    };
    let alter_id: u64 = value_text(&share.aid).parse().unwrap_or(0);
    let cipher = match value_text(&share.scy) {
        scy if scy.is_empty() => "auto".to_string(),
        scy => scy,
    };
    let net = value_text(&share.net);
    let path = value_text(&share.path);

    let mut q = Query::new();
    let mut put = |k: &str, v: &str| {
        if !v.is_empty() {
            q.insert(k.to_string(), v.to_string());
        }
    };
    put("type", &net);
    put("security", &value_text(&share.tls));
    put("sni", &value_text(&share.sni));
    put("fp", &value_text(&share.fp));
    put("alpn", &value_text(&share.alpn));
    put("host", &value_text(&share.host));
    if net == "grpc" {
        put("serviceName", &path);
    } else {
        put("path", &path);
    }

    let settings = json!({
        "vnext": [{
            "address": address,
            "port": port,
            "users": [{"id": id, "alterId": alter_id, "security": cipher}],
        }]
    });
    let tag = match value_text(&share.ps) {
        ps if ps.is_empty() => synthesize_label("vmess"),
        ps => ps,
    };
    Ok(OutboundRecord {
        tag,
        protocol: "vmess".to_string(),
        settings,
        stream_settings: Some(stream_from_query(&q, &address)),
        extra: Map::new(),
    })
}

pub(crate) fn encode(
    record: &OutboundRecord,
    ep: &Endpoint,
    address: &str,
    port: u16,
    credential: &str,
) -> Result<String, LinkError> {
    let t = transport_params(record.stream_settings.as_ref());
    let path = if t.network == "grpc" {
        t.service_name
    } else {
        t.path
    };
    let share = VmessShare {
        v: json!("2"),
        ps: json!(record.tag),
        add: json!(address),
        port: json!(port.to_string()),
        id: json!(credential),
        aid: json!("0"),
        scy: json!(ep.cipher.as_deref().unwrap_or("auto")),
        net: json!(t.network),
        kind: json!("none"),
        host: json!(t.host.unwrap_or_default()),
        path: json!(path.unwrap_or_default()),
        tls: json!(t.security.unwrap_or_default()),
        sni: json!(t.sni.unwrap_or_default()),
        alpn: json!(t.alpn.unwrap_or_default()),
        fp: json!(t.fp.unwrap_or_default()),
    };
    let body =
        serde_json::to_string(&share).map_err(|e| LinkError::VmessPayload(e.to_string()))?;
    Ok(format!("vmess://{}", b64::encode_standard(body.as_bytes())))
}
