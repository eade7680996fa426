use std::collections::HashMap;

use log::debug;

use super::common::{parse_port, unsupported_scheme};
use crate::error::DecodeError;
use crate::models::SsrProxy;
use crate::utils::base64::url_safe_base64_decode;

/// Parse a ShadowsocksR link into an [`SsrProxy`]
///
/// The payload is
/// `base64(server:port:protocol:method:obfs:base64(password)/?obfsparam=..&protoparam=..)`.
pub fn explode_ssr(ssr: &str) -> Result<SsrProxy, DecodeError> {
    let encoded = ssr
        .strip_prefix("ssr://")
        .ok_or_else(|| unsupported_scheme(ssr))?;
    let decoded = url_safe_base64_decode(encoded.trim())?;
    let decoded = decoded.trim();

    let (basic, query) = match decoded.split_once('/') {
        Some((basic, query)) => (basic, Some(query)),
        None => (decoded, None),
    };

    // Split from the right so an IPv6 server keeps its colons
    let mut fields = basic.rsplitn(6, ':');
    let (password, obfs, method, protocol, port, server) = match (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) {
        (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)) => (a, b, c, d, e, f),
        _ => {
            return Err(DecodeError::InvalidFormat(
                "ssr link needs server:port:protocol:method:obfs:password".into(),
            ))
        }
    };

    let server = server.trim_start_matches('[').trim_end_matches(']');
    if server.is_empty() {
        return Err(DecodeError::MissingField("server"));
    }

    let mut node = SsrProxy {
        server: server.to_string(),
        port: parse_port(port)?,
        protocol: protocol.to_string(),
        cipher: method.to_string(),
        obfs: obfs.to_string(),
        password: url_safe_base64_decode(password)?,
        ..Default::default()
    };

    if let Some(query) = query {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params: HashMap<String, String> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        node.obfs_param = decoded_param(&params, &["obfsparam", "obfs_param"]);
        node.protocol_param = decoded_param(&params, &["protoparam", "protocol_param"]);
    }

    Ok(node)
}

/// Base64-decode the first non-empty parameter among `keys`.
fn decoded_param(params: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    let (key, value) = keys
        .iter()
        .find_map(|key| params.get(*key).filter(|v| !v.is_empty()).map(|v| (key, v)))?;
    // form decoding turns a literal '+' into a space
    match url_safe_base64_decode(&value.replace(' ', "+")) {
        Ok(decoded) if !decoded.is_empty() => Some(decoded),
        Ok(_) => None,
        Err(e) => {
            debug!("ignoring undecodable ssr parameter {}: {}", key, e);
            None
        }
    }
}
