use serde_json::json;

use crate::models::{ProxyRecord, SsProxy, SsrProxy, VmessProxy, VmessTransport};
use crate::utils::base64::{base64_encode, url_safe_base64_encode};
use crate::utils::url::url_encode;

/// Encode a record back into its share link. `None` for record types that
/// have no link form.
pub fn proxy_to_link(record: &ProxyRecord) -> Option<String> {
    match record {
        ProxyRecord::Ss(ss) => Some(ss_link(ss)),
        ProxyRecord::Ssr(ssr) => Some(ssr_link(ssr)),
        ProxyRecord::Vmess(vmess) => Some(vmess_link(vmess)),
        ProxyRecord::Other { .. } => None,
    }
}

/// `ss://base64(method:password)@server:port/?plugin=...` (SIP002)
pub fn ss_link(node: &SsProxy) -> String {
    let user_info = url_safe_base64_encode(&format!("{}:{}", node.cipher, node.password));
    let mut link = format!("ss://{}@{}:{}", user_info, bracket_host(&node.server), node.port);

    let mut params = Vec::new();
    if let Some(plugin) = &node.plugin {
        let mut plugin_value = plugin.clone();
        if let Some(obfs) = &node.obfs {
            plugin_value.push_str(&format!(";obfs={}", obfs));
        }
        if let Some(obfs_host) = &node.obfs_host {
            plugin_value.push_str(&format!(";obfs-host={}", obfs_host));
        }
        params.push(format!("plugin={}", url_encode(&plugin_value)));
    } else {
        if let Some(obfs) = &node.obfs {
            params.push(format!("obfs={}", url_encode(obfs)));
        }
        if let Some(obfs_host) = &node.obfs_host {
            params.push(format!("obfs-host={}", url_encode(obfs_host)));
        }
    }
    for (key, value) in &node.params {
        params.push(format!("{}={}", url_encode(key), url_encode(value)));
    }

    if !params.is_empty() {
        link.push_str(&format!("/?{}", params.join("&")));
    }
    link
}

/// `ssr://base64(server:port:protocol:method:obfs:base64(password)/?obfsparam=..&protoparam=..)`
pub fn ssr_link(node: &SsrProxy) -> String {
    let mut plain_text = format!(
        "{}:{}:{}:{}:{}:{}",
        node.server,
        node.port,
        node.protocol,
        node.cipher,
        node.obfs,
        url_safe_base64_encode(&node.password)
    );

    let mut params = Vec::new();
    if let Some(obfs_param) = &node.obfs_param {
        params.push(format!("obfsparam={}", url_safe_base64_encode(obfs_param)));
    }
    if let Some(protocol_param) = &node.protocol_param {
        params.push(format!("protoparam={}", url_safe_base64_encode(protocol_param)));
    }
    if !params.is_empty() {
        plain_text.push_str(&format!("/?{}", params.join("&")));
    }

    format!("ssr://{}", url_safe_base64_encode(&plain_text))
}

/// `vmess://base64(json)` in the v2rayN layout
pub fn vmess_link(node: &VmessProxy) -> String {
    let mut vmess_json = json!({
        "v": "2",
        "add": node.server,
        "port": node.port,
        "id": node.uuid,
        "aid": node.alter_id,
        "net": node.network,
        "udp": node.udp,
        "tls": if node.tls { "tls" } else { "none" },
    });

    match &node.transport {
        Some(VmessTransport::Ws { path, host }) | Some(VmessTransport::H2 { path, host }) => {
            vmess_json["path"] = json!(path);
            if let Some(host) = host {
                vmess_json["host"] = json!(host);
            }
        }
        Some(VmessTransport::Http { path, method, host }) => {
            vmess_json["path"] = json!(path);
            if let Some(method) = method {
                vmess_json["method"] = json!(method);
            }
            if let Some(host) = host {
                vmess_json["host"] = json!(host);
            }
        }
        Some(VmessTransport::Grpc { service_name }) => {
            vmess_json["grpc-service-name"] = json!(service_name);
        }
        None => {}
    }

    format!("vmess://{}", base64_encode(&vmess_json.to_string()))
}

fn bracket_host(server: &str) -> String {
    if server.contains(':') {
        format!("[{}]", server)
    } else {
        server.to_string()
    }
}
