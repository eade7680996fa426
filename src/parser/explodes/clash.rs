use serde_yaml::Value;

use super::common::{parse_port, parse_u16};
use crate::error::DecodeError;
use crate::models::{Proxy, ProxyRecord, SsProxy, SsrProxy, VmessProxy, VmessTransport};

/// Parse the proxy list of a Clash YAML document
///
/// Returns `None` when `content` is not a YAML mapping with a `proxies` (or
/// legacy `Proxy`) sequence, so the caller can treat it as a link list
/// instead. Each entry keeps its own `name`; entries of types this tool does
/// not decode become [`ProxyRecord::Other`].
pub fn explode_clash(content: &str) -> Option<Vec<Result<Proxy, DecodeError>>> {
    let yaml: Value = serde_yaml::from_str(content).ok()?;

    let proxies = match yaml.get("proxies") {
        Some(Value::Sequence(seq)) => seq,
        _ => match yaml.get("Proxy") {
            Some(Value::Sequence(seq)) => seq,
            _ => return None,
        },
    };

    Some(proxies.iter().map(parse_clash_proxy).collect())
}

/// Parse a single proxy from Clash YAML
fn parse_clash_proxy(proxy: &Value) -> Result<Proxy, DecodeError> {
    let fields = proxy
        .as_mapping()
        .ok_or_else(|| DecodeError::InvalidFormat("proxy entry is not a mapping".into()))?;
    let proxy_type = yaml_str(proxy, "type").ok_or(DecodeError::MissingField("type"))?;
    let name = yaml_str(proxy, "name").ok_or(DecodeError::MissingField("name"))?;

    let record = match proxy_type.to_lowercase().as_str() {
        "ss" | "shadowsocks" => parse_clash_ss(proxy)?.into(),
        "ssr" | "shadowsocksr" => parse_clash_ssr(proxy)?.into(),
        "vmess" => parse_clash_vmess(proxy)?.into(),
        _ => ProxyRecord::Other {
            proxy_type,
            fields: fields.clone(),
        },
    };

    Ok(Proxy { name, record })
}

/// Parse a Shadowsocks proxy from Clash YAML
fn parse_clash_ss(proxy: &Value) -> Result<SsProxy, DecodeError> {
    let mut node = SsProxy {
        server: required_str(proxy, "server")?,
        port: yaml_port(proxy.get("port"))?,
        password: required_str(proxy, "password")?,
        cipher: required_str(proxy, "cipher")?,
        ..Default::default()
    };

    if let Some(plugin) = yaml_str(proxy, "plugin") {
        if let Some(opts) = proxy.get("plugin-opts") {
            node.obfs = yaml_str(opts, "mode");
            node.obfs_host = yaml_str(opts, "host");
        }
        node.plugin = Some(plugin);
    } else if let Some(obfs) = yaml_str(proxy, "obfs") {
        // Legacy support for obfs and obfs-host fields
        node.plugin = Some("obfs".to_string());
        node.obfs = Some(obfs);
        node.obfs_host = yaml_str(proxy, "obfs-host");
    }

    Ok(node)
}

/// Parse a ShadowsocksR proxy from Clash YAML
fn parse_clash_ssr(proxy: &Value) -> Result<SsrProxy, DecodeError> {
    Ok(SsrProxy {
        server: required_str(proxy, "server")?,
        port: yaml_port(proxy.get("port"))?,
        protocol: required_str(proxy, "protocol")?,
        cipher: required_str(proxy, "cipher")?,
        obfs: required_str(proxy, "obfs")?,
        password: required_str(proxy, "password")?,
        obfs_param: yaml_str(proxy, "obfs-param"),
        protocol_param: yaml_str(proxy, "protocol-param"),
    })
}

/// Parse a VMess proxy from Clash YAML
fn parse_clash_vmess(proxy: &Value) -> Result<VmessProxy, DecodeError> {
    let network = yaml_str(proxy, "network").unwrap_or_else(|| "tcp".to_string());

    let transport = match network.as_str() {
        "ws" => {
            let ws = proxy.get("ws-opts");
            Some(VmessTransport::Ws {
                path: opt_str(ws, "path").unwrap_or_default(),
                host: opt_str(ws.and_then(|ws| ws.get("headers")), "Host"),
            })
        }
        "h2" => {
            let h2 = proxy.get("h2-opts");
            Some(VmessTransport::H2 {
                path: opt_str(h2, "path").unwrap_or_default(),
                host: first_str(h2.and_then(|h2| h2.get("host"))),
            })
        }
        "http" => {
            let http = proxy.get("http-opts");
            let headers = http.and_then(|http| http.get("headers"));
            Some(VmessTransport::Http {
                path: first_str(http.and_then(|http| http.get("path"))).unwrap_or_default(),
                method: opt_str(http, "method"),
                host: first_str(headers.and_then(|h| h.get("Host").or_else(|| h.get("host")))),
            })
        }
        "grpc" => Some(VmessTransport::Grpc {
            service_name: opt_str(proxy.get("grpc-opts"), "grpc-service-name").unwrap_or_default(),
        }),
        _ => None,
    };

    let alter_id = match proxy.get("alterId") {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| DecodeError::InvalidField {
                field: "alterId",
                value: n.to_string(),
            })?,
        Some(Value::String(s)) => {
            parse_u16(s).ok_or_else(|| DecodeError::InvalidField {
                field: "alterId",
                value: s.clone(),
            })?
        }
        Some(_) => {
            return Err(DecodeError::InvalidField {
                field: "alterId",
                value: "non-scalar".to_string(),
            })
        }
    };

    Ok(VmessProxy {
        server: required_str(proxy, "server")?,
        port: yaml_port(proxy.get("port"))?,
        uuid: required_str(proxy, "uuid")?,
        alter_id,
        cipher: yaml_str(proxy, "cipher").unwrap_or_else(|| "auto".to_string()),
        network,
        udp: yaml_bool(proxy.get("udp")),
        tls: yaml_bool(proxy.get("tls")),
        transport,
    })
}

/// Non-empty string (or number) value under `key`.
fn yaml_str(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn opt_str(value: Option<&Value>, key: &str) -> Option<String> {
    value.and_then(|v| yaml_str(v, key))
}

fn required_str(value: &Value, key: &'static str) -> Result<String, DecodeError> {
    yaml_str(value, key).ok_or(DecodeError::MissingField(key))
}

/// Ports may be written as numbers or quoted strings.
fn yaml_port(value: Option<&Value>) -> Result<u16, DecodeError> {
    match value {
        Some(Value::Number(n)) => parse_port(&n.to_string()),
        Some(Value::String(s)) => parse_port(s),
        None | Some(Value::Null) => Err(DecodeError::MissingField("port")),
        Some(_) => Err(DecodeError::InvalidPort("non-scalar".to_string())),
    }
}

fn yaml_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// A string, or the first string of a sequence.
fn first_str(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Sequence(seq) => seq.iter().find_map(|v| v.as_str()).map(str::to_string),
        _ => None,
    }
}
