use serde_json::Value as JsonValue;

use crate::error::DecodeError;
use crate::models::{ProxyRecord, ProxyType};
use crate::utils::url::is_link;

/// What a single whitespace-separated token refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Proxy(ProxyType),
    Subscription,
    Unknown,
}

/// Classify a token by its scheme prefix.
pub fn link_kind(link: &str) -> LinkKind {
    if link.starts_with("ss://") {
        LinkKind::Proxy(ProxyType::Shadowsocks)
    } else if link.starts_with("ssr://") {
        LinkKind::Proxy(ProxyType::ShadowsocksR)
    } else if link.starts_with("vmess://") {
        LinkKind::Proxy(ProxyType::VMess)
    } else if is_link(link) {
        LinkKind::Subscription
    } else {
        LinkKind::Unknown
    }
}

/// Explode a proxy link into a record
///
/// Detects the link type and calls the matching decoder. Subscription links
/// and unknown schemes are rejected with [`DecodeError::UnsupportedScheme`].
pub fn explode(link: &str) -> Result<ProxyRecord, DecodeError> {
    let link = link.trim();
    match link_kind(link) {
        LinkKind::Proxy(ProxyType::Shadowsocks) => super::ss::explode_ss(link).map(Into::into),
        LinkKind::Proxy(ProxyType::ShadowsocksR) => super::ssr::explode_ssr(link).map(Into::into),
        LinkKind::Proxy(ProxyType::VMess) => super::vmess::explode_vmess(link).map(Into::into),
        LinkKind::Subscription | LinkKind::Unknown => Err(unsupported_scheme(link)),
    }
}

pub(crate) fn unsupported_scheme(link: &str) -> DecodeError {
    let scheme = link.split_once("://").map_or(link, |(scheme, _)| scheme);
    DecodeError::UnsupportedScheme(scheme.chars().take(16).collect())
}

/// Parse a port written as text, accepting `"443"` as well as `"443.0"`.
pub fn parse_port(raw: &str) -> Result<u16, DecodeError> {
    match parse_u16(raw) {
        Some(port) if port != 0 => Ok(port),
        _ => Err(DecodeError::InvalidPort(raw.to_string())),
    }
}

/// Parse an unsigned 16-bit number written as an integer or an integral float.
pub fn parse_u16(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u16>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&value) {
        Some(value as u16)
    } else {
        None
    }
}

/// Coerce a JSON number or numeric string into a port.
pub fn json_port(value: &JsonValue) -> Result<u16, DecodeError> {
    match value {
        JsonValue::String(s) => parse_port(s),
        JsonValue::Number(n) => parse_port(&n.to_string()),
        other => Err(DecodeError::InvalidPort(other.to_string())),
    }
}

/// Coerce a JSON number or numeric string into a `u16` field.
pub fn json_u16(field: &'static str, value: &JsonValue) -> Result<u16, DecodeError> {
    let parsed = match value {
        JsonValue::String(s) if s.trim().is_empty() => Some(0),
        JsonValue::String(s) => parse_u16(s),
        JsonValue::Number(n) => parse_u16(&n.to_string()),
        _ => None,
    };
    parsed.ok_or_else(|| DecodeError::InvalidField {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_link_kind() {
        assert_eq!(
            link_kind("ss://abc"),
            LinkKind::Proxy(ProxyType::Shadowsocks)
        );
        assert_eq!(
            link_kind("ssr://abc"),
            LinkKind::Proxy(ProxyType::ShadowsocksR)
        );
        assert_eq!(link_kind("vmess://abc"), LinkKind::Proxy(ProxyType::VMess));
        assert_eq!(link_kind("https://example.com/sub"), LinkKind::Subscription);
        assert_eq!(link_kind("http://example.com/sub"), LinkKind::Subscription);
        assert_eq!(link_kind("trojan://abc"), LinkKind::Unknown);
        assert_eq!(link_kind("ss:/"), LinkKind::Unknown);
    }

    #[test]
    fn test_explode_rejects_unknown_scheme() {
        let err = explode("trojan://password@example.com:443").unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedScheme(ref s) if s == "trojan"));
    }

    #[test]
    fn test_explode_dispatches_ss() {
        let record = explode("  ss://YWVzLTI1Ni1nY206VGhpcyBpcyBhIFRlc3RAMTI3LjAuMC4xOjEwMDg2 ")
            .unwrap();
        assert_eq!(record.type_name(), "ss");
        assert_eq!(record.port(), 10086);
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("443").unwrap(), 443);
        assert_eq!(parse_port(" 8388 ").unwrap(), 8388);
        assert_eq!(parse_port("10086.0").unwrap(), 10086);
        assert!(parse_port("0").is_err());
        assert!(parse_port("65536").is_err());
        assert!(parse_port("80.5").is_err());
        assert!(parse_port("http").is_err());
    }

    #[test]
    fn test_json_port_accepts_string_and_number() {
        assert_eq!(json_port(&json!(443)).unwrap(), 443);
        assert_eq!(json_port(&json!("443")).unwrap(), 443);
        assert_eq!(json_port(&json!(443.0)).unwrap(), 443);
        assert!(json_port(&json!(null)).is_err());
        assert!(json_port(&json!(true)).is_err());
    }

    #[test]
    fn test_json_u16() {
        assert_eq!(json_u16("aid", &json!("64")).unwrap(), 64);
        assert_eq!(json_u16("aid", &json!(0)).unwrap(), 0);
        assert_eq!(json_u16("aid", &json!("")).unwrap(), 0);
        assert!(json_u16("aid", &json!("abc")).is_err());
    }
}
