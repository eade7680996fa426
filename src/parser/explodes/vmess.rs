use log::debug;
use serde_json::{Map, Value};

use super::common::{json_port, json_u16, unsupported_scheme};
use crate::error::DecodeError;
use crate::models::{VmessProxy, VmessTransport};
use crate::utils::base64::url_safe_base64_decode;

/// Parse a VMess link into a [`VmessProxy`]
///
/// The payload is base64-encoded JSON in the v2rayN layout, e.g.
/// `{"v":"2","add":"1.2.3.4","port":443,"id":"...","aid":"0","net":"ws","host":"","path":"/","tls":"tls"}`.
pub fn explode_vmess(vmess: &str) -> Result<VmessProxy, DecodeError> {
    let encoded = vmess
        .strip_prefix("vmess://")
        .ok_or_else(|| unsupported_scheme(vmess))?;
    let decoded = url_safe_base64_decode(encoded.trim())?;
    let json: Value = serde_json::from_str(&decoded)?;
    let json = json
        .as_object()
        .ok_or_else(|| DecodeError::InvalidFormat("vmess payload is not a JSON object".into()))?;

    let server = string_field(json, "add").ok_or(DecodeError::MissingField("add"))?;
    let port = json_port(json.get("port").ok_or(DecodeError::MissingField("port"))?)?;
    let uuid = string_field(json, "id").ok_or(DecodeError::MissingField("id"))?;
    let alter_id = match json.get("aid") {
        None | Some(Value::Null) => 0,
        Some(aid) => json_u16("aid", aid).unwrap_or_else(|e| {
            debug!("{}, using alterId 0", e);
            0
        }),
    };
    let network = string_field(json, "net").unwrap_or_else(|| "tcp".to_string());

    let path = string_field(json, "path").unwrap_or_default();
    let host = string_field(json, "host");
    let transport = match network.as_str() {
        "ws" => Some(VmessTransport::Ws { path, host }),
        "h2" => Some(VmessTransport::H2 { path, host }),
        "http" => Some(VmessTransport::Http {
            path,
            method: string_field(json, "method"),
            host,
        }),
        "grpc" => Some(VmessTransport::Grpc {
            service_name: string_field(json, "grpc-service-name")
                .or_else(|| string_field(json, "serviceName"))
                .unwrap_or(path),
        }),
        _ => None,
    };

    Ok(VmessProxy {
        server,
        port,
        uuid,
        alter_id,
        cipher: "auto".to_string(),
        network,
        udp: udp_enabled(json.get("udp")),
        tls: tls_enabled(json.get("tls")),
        transport,
    })
}

/// `udp` is off when the field is absent, empty, `"none"` or `"false"`.
pub fn udp_enabled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(enabled)) => *enabled,
        Some(Value::String(s)) => !matches!(s.as_str(), "" | "none" | "false"),
        Some(_) => true,
    }
}

/// `tls` is off only for the literal `"none"` (or JSON `false`). Any other
/// value, including an empty or missing field, turns it on.
pub fn tls_enabled(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => s != "none",
        Some(Value::Bool(enabled)) => *enabled,
        _ => true,
    }
}

/// Non-empty string (or number) field.
fn string_field(json: &Map<String, Value>, key: &str) -> Option<String> {
    match json.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
