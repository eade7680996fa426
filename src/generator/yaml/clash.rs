use log::warn;
use serde::Serialize;

use crate::models::{Proxy, ProxyRecord, SsProxy, SsrProxy, VmessProxy, VmessTransport};

/// Render proxies as a Clash `proxies:` block
///
/// Every entry starts with `  - name: ...` and carries its fields in a fixed
/// order per type. Records of a type Clash output is not defined for are
/// logged and skipped; the remaining records are still written.
///
/// ```
/// use uri_decoder::generator::proxies_to_yaml;
/// use uri_decoder::models::{Proxy, SsProxy};
///
/// let node = Proxy::new(
///     "test",
///     SsProxy {
///         server: "127.0.0.1".to_string(),
///         port: 10086,
///         password: "pass".to_string(),
///         cipher: "aes-256-gcm".to_string(),
///         ..Default::default()
///     },
/// );
/// assert!(proxies_to_yaml(&[node]).starts_with("proxies:\n  - name: test\n    type: ss\n"));
/// ```
pub fn proxies_to_yaml(nodes: &[Proxy]) -> String {
    let entries: Vec<String> = nodes.iter().filter_map(proxy_to_yaml).collect();
    if entries.is_empty() {
        return "proxies: []\n".to_string();
    }

    let mut output = String::from("proxies:\n");
    for entry in entries {
        output.push_str(&entry);
    }
    output
}

/// A single list entry, or `None` when the record type has no Clash layout.
fn proxy_to_yaml(node: &Proxy) -> Option<String> {
    let mut entry = Entry::new(&node.name);
    match &node.record {
        ProxyRecord::Ss(ss) => write_ss(&mut entry, ss),
        ProxyRecord::Ssr(ssr) => write_ssr(&mut entry, ssr),
        ProxyRecord::Vmess(vmess) => write_vmess(&mut entry, vmess),
        ProxyRecord::Other { proxy_type, .. } => {
            warn!(
                "skipping proxy '{}': unsupported type '{}'",
                node.name, proxy_type
            );
            return None;
        }
    }
    Some(entry.finish())
}

fn write_ss(entry: &mut Entry, ss: &SsProxy) {
    entry.field(1, "type", "ss");
    entry.field(1, "server", &ss.server);
    entry.field(1, "port", ss.port);
    entry.field(1, "password", &ss.password);
    entry.field(1, "cipher", &ss.cipher);

    if let Some(plugin) = &ss.plugin {
        entry.field(1, "plugin", plugin);
        entry.section(1, "plugin-opts");
        entry.field(2, "mode", ss.obfs.as_deref().unwrap_or_default());
        entry.field(2, "host", ss.obfs_host.as_deref().unwrap_or_default());
    }
}

fn write_ssr(entry: &mut Entry, ssr: &SsrProxy) {
    entry.field(1, "type", "ssr");
    entry.field(1, "server", &ssr.server);
    entry.field(1, "port", ssr.port);
    entry.field(1, "password", &ssr.password);
    entry.field(1, "cipher", &ssr.cipher);
    entry.field(1, "obfs", &ssr.obfs);
    entry.field(1, "protocol", &ssr.protocol);
    if let Some(obfs_param) = &ssr.obfs_param {
        entry.field(1, "obfs-param", obfs_param);
    }
    if let Some(protocol_param) = &ssr.protocol_param {
        entry.field(1, "protocol-param", protocol_param);
    }
}

fn write_vmess(entry: &mut Entry, vmess: &VmessProxy) {
    entry.field(1, "type", "vmess");
    entry.field(1, "server", &vmess.server);
    entry.field(1, "port", vmess.port);
    entry.field(1, "uuid", &vmess.uuid);
    entry.field(1, "alterId", vmess.alter_id);
    entry.field(1, "cipher", &vmess.cipher);
    entry.field(1, "udp", vmess.udp);
    entry.field(1, "tls", vmess.tls);
    entry.field(1, "network", &vmess.network);

    match &vmess.transport {
        Some(VmessTransport::Ws { path, host }) => {
            entry.section(1, "ws-opts");
            entry.field(2, "path", path);
            if let Some(host) = host {
                entry.section(2, "headers");
                entry.field(3, "Host", host);
            }
        }
        Some(VmessTransport::H2 { path, host }) => {
            entry.section(1, "h2-opts");
            entry.field(2, "path", path);
            if let Some(host) = host {
                entry.section(2, "host");
                entry.item(3, host);
            }
        }
        Some(VmessTransport::Http { path, method, host }) => {
            entry.section(1, "http-opts");
            entry.field(2, "method", method.as_deref().unwrap_or("GET"));
            entry.section(2, "path");
            entry.item(3, path);
            if let Some(host) = host {
                entry.section(2, "headers");
                entry.section(3, "Host");
                entry.item(4, host);
            }
        }
        Some(VmessTransport::Grpc { service_name }) => {
            entry.section(1, "grpc-opts");
            entry.field(2, "grpc-service-name", service_name);
        }
        None => {}
    }
}

/// Line builder for one list entry. Level 1 is the entry's own fields.
struct Entry {
    output: String,
}

impl Entry {
    fn new(name: &str) -> Self {
        Entry {
            output: format!("  - name: {}\n", scalar(name)),
        }
    }

    fn field(&mut self, level: usize, key: &str, value: impl Serialize) {
        self.output
            .push_str(&format!("{}{}: {}\n", indent(level), key, scalar(value)));
    }

    fn section(&mut self, level: usize, key: &str) {
        self.output.push_str(&format!("{}{}:\n", indent(level), key));
    }

    fn item(&mut self, level: usize, value: impl Serialize) {
        self.output
            .push_str(&format!("{}- {}\n", indent(level), scalar(value)));
    }

    fn finish(self) -> String {
        self.output
    }
}

fn indent(level: usize) -> String {
    "  ".repeat(level + 1)
}

/// Render a scalar the way serde_yaml would, quoting it when required.
///
/// Multi-line strings come out of serde_yaml as block scalars, which do not
/// fit on a `key: value` line; those use a JSON string instead, which YAML
/// reads as a double-quoted scalar.
fn scalar(value: impl Serialize) -> String {
    match serde_yaml::to_string(&value) {
        Ok(rendered) if !rendered.trim_end().contains('\n') => rendered.trim_end().to_string(),
        _ => serde_json::to_string(&value).unwrap_or_else(|_| "''".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_quoting() {
        assert_eq!(scalar("plain"), "plain");
        assert_eq!(scalar(443u16), "443");
        assert_eq!(scalar(true), "true");
        assert_eq!(scalar(""), "''");
        assert_eq!(scalar("10086"), "'10086'");
        assert_eq!(scalar("a: b"), "'a: b'");
        assert_eq!(scalar("two\nlines"), "\"two\\nlines\"");
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(proxies_to_yaml(&[]), "proxies: []\n");
    }

    #[test]
    fn test_ssr_optional_params() {
        let node = Proxy::new(
            "r",
            SsrProxy {
                server: "1.2.3.4".to_string(),
                port: 8989,
                protocol: "origin".to_string(),
                cipher: "aes-256-cfb".to_string(),
                obfs: "plain".to_string(),
                password: "pw".to_string(),
                obfs_param: None,
                protocol_param: Some("auth".to_string()),
            },
        );
        let yaml = proxies_to_yaml(&[node]);
        assert_eq!(
            yaml,
            "proxies:\n  - name: r\n    type: ssr\n    server: 1.2.3.4\n    port: 8989\n    password: pw\n    cipher: aes-256-cfb\n    obfs: plain\n    protocol: origin\n    protocol-param: auth\n"
        );
    }

    #[test]
    fn test_vmess_grpc_block() {
        let node = Proxy::new(
            "g",
            VmessProxy {
                server: "g.example.com".to_string(),
                port: 443,
                uuid: "id".to_string(),
                network: "grpc".to_string(),
                tls: true,
                transport: Some(VmessTransport::Grpc {
                    service_name: "svc".to_string(),
                }),
                ..Default::default()
            },
        );
        let yaml = proxies_to_yaml(&[node]);
        assert!(yaml.ends_with("    network: grpc\n    grpc-opts:\n      grpc-service-name: svc\n"));
    }
}
