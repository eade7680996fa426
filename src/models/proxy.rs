//! Proxy model definitions
//!
//! One strongly typed struct per link scheme, a tagged [`ProxyRecord`] over
//! them, and the [`Proxy`] wrapper that carries the display name added
//! during enrichment.

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::Mapping;

/// Represents the type of a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyType {
    Shadowsocks,
    ShadowsocksR,
    VMess,
}

impl ProxyType {
    /// The `type` value used in Clash configurations and in display names.
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "ss",
            ProxyType::ShadowsocksR => "ssr",
            ProxyType::VMess => "vmess",
        }
    }

    /// Link scheme prefix, including the `://` separator.
    pub fn scheme(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "ss://",
            ProxyType::ShadowsocksR => "ssr://",
            ProxyType::VMess => "vmess://",
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Shadowsocks server decoded from an `ss://` link.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SsProxy {
    pub server: String,
    pub port: u16,
    pub password: String,
    pub cipher: String,
    pub plugin: Option<String>,
    /// Obfuscation mode, emitted as `plugin-opts.mode`
    pub obfs: Option<String>,
    pub obfs_host: Option<String>,
    /// Query parameters other than `plugin`, `obfs` and `obfs-host`, verbatim
    pub params: BTreeMap<String, String>,
}

/// A ShadowsocksR server decoded from an `ssr://` link.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SsrProxy {
    pub server: String,
    pub port: u16,
    pub protocol: String,
    pub cipher: String,
    pub obfs: String,
    pub password: String,
    pub obfs_param: Option<String>,
    pub protocol_param: Option<String>,
}

/// Transport options of a VMess server, selected by its `network`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmessTransport {
    /// `ws-opts`; the header key is `Host`
    Ws { path: String, host: Option<String> },
    /// `h2-opts`; the header key is lower-case `host`
    H2 { path: String, host: Option<String> },
    /// `http-opts`
    Http {
        path: String,
        method: Option<String>,
        host: Option<String>,
    },
    /// `grpc-opts`
    Grpc { service_name: String },
}

impl VmessTransport {
    pub fn network(&self) -> &'static str {
        match self {
            VmessTransport::Ws { .. } => "ws",
            VmessTransport::H2 { .. } => "h2",
            VmessTransport::Http { .. } => "http",
            VmessTransport::Grpc { .. } => "grpc",
        }
    }
}

/// A VMess server decoded from a `vmess://` link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmessProxy {
    pub server: String,
    pub port: u16,
    pub uuid: String,
    pub alter_id: u16,
    pub cipher: String,
    pub network: String,
    pub udp: bool,
    pub tls: bool,
    pub transport: Option<VmessTransport>,
}

impl Default for VmessProxy {
    fn default() -> Self {
        VmessProxy {
            server: String::new(),
            port: 0,
            uuid: String::new(),
            alter_id: 0,
            cipher: "auto".to_string(),
            network: "tcp".to_string(),
            udp: false,
            tls: false,
            transport: None,
        }
    }
}

/// A decoded proxy server.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyRecord {
    Ss(SsProxy),
    Ssr(SsrProxy),
    Vmess(VmessProxy),
    /// An entry of an imported Clash document whose type this tool does not
    /// decode. Kept so it can be reported when the list is rendered.
    Other {
        proxy_type: String,
        fields: Mapping,
    },
}

impl ProxyRecord {
    pub fn proxy_type(&self) -> Option<ProxyType> {
        match self {
            ProxyRecord::Ss(_) => Some(ProxyType::Shadowsocks),
            ProxyRecord::Ssr(_) => Some(ProxyType::ShadowsocksR),
            ProxyRecord::Vmess(_) => Some(ProxyType::VMess),
            ProxyRecord::Other { .. } => None,
        }
    }

    /// The `type` string, including unrecognized ones.
    pub fn type_name(&self) -> &str {
        match self {
            ProxyRecord::Other { proxy_type, .. } => proxy_type,
            _ => self.proxy_type().map(ProxyType::as_str).unwrap_or_default(),
        }
    }

    pub fn server(&self) -> &str {
        match self {
            ProxyRecord::Ss(ss) => &ss.server,
            ProxyRecord::Ssr(ssr) => &ssr.server,
            ProxyRecord::Vmess(vmess) => &vmess.server,
            ProxyRecord::Other { fields, .. } => fields
                .get("server")
                .and_then(|v| v.as_str())
                .unwrap_or_default(),
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            ProxyRecord::Ss(ss) => ss.port,
            ProxyRecord::Ssr(ssr) => ssr.port,
            ProxyRecord::Vmess(vmess) => vmess.port,
            ProxyRecord::Other { fields, .. } => fields
                .get("port")
                .and_then(|v| v.as_u64())
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(0),
        }
    }
}

impl From<SsProxy> for ProxyRecord {
    fn from(value: SsProxy) -> Self {
        ProxyRecord::Ss(value)
    }
}

impl From<SsrProxy> for ProxyRecord {
    fn from(value: SsrProxy) -> Self {
        ProxyRecord::Ssr(value)
    }
}

impl From<VmessProxy> for ProxyRecord {
    fn from(value: VmessProxy) -> Self {
        ProxyRecord::Vmess(value)
    }
}

/// A record together with its display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Proxy {
    pub name: String,
    pub record: ProxyRecord,
}

impl Proxy {
    pub fn new(name: impl Into<String>, record: impl Into<ProxyRecord>) -> Self {
        Proxy {
            name: name.into(),
            record: record.into(),
        }
    }
}
