use url::{Host, Url};

use super::common::{parse_port, unsupported_scheme};
use crate::error::DecodeError;
use crate::models::SsProxy;
use crate::utils::base64::url_safe_base64_decode;
use crate::utils::url::{split_fragment, url_decode};

/// Parse a Shadowsocks link into an [`SsProxy`]
///
/// Accepted layouts:
/// * `ss://base64(method:password@host:port)`
/// * `ss://base64(method:password)@host:port/?plugin=...`
/// * `ss://method:password@host:port/?plugin=...`
///
/// A `#remark` suffix is ignored; the display name is generated later.
pub fn explode_ss(ss: &str) -> Result<SsProxy, DecodeError> {
    let content = ss
        .strip_prefix("ss://")
        .ok_or_else(|| unsupported_scheme(ss))?;
    let (content, _remark) = split_fragment(content);

    let (user_info, host_info) = match content.split_once('@') {
        Some((user, host)) => {
            let user = if user.contains(':') {
                url_decode(user)
            } else {
                url_safe_base64_decode(user)?
            };
            (user, host.to_string())
        }
        None => {
            let decoded = url_safe_base64_decode(content)?;
            // The password may contain '@'; the host part never does
            let (user, host) = decoded.trim().rsplit_once('@').ok_or_else(|| {
                DecodeError::InvalidFormat("ss link has no '@' between credentials and host".into())
            })?;
            (user.to_string(), host.to_string())
        }
    };

    let (method, password) = user_info.split_once(':').ok_or_else(|| {
        DecodeError::InvalidFormat("ss credentials are not in method:password form".into())
    })?;

    // A scheme without a default port keeps explicit ports such as :80 visible
    let url = Url::parse(&format!("ss://{}", host_info))?;
    if !url.username().is_empty() || url.password().is_some() {
        return Err(DecodeError::InvalidFormat(
            "ss host part contains an unescaped '@'".into(),
        ));
    }
    let server = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(DecodeError::MissingField("server")),
    };
    let port = match url.port() {
        Some(port) => parse_port(&port.to_string())?,
        None => return Err(DecodeError::MissingField("port")),
    };

    let mut node = SsProxy {
        server,
        port,
        password: password.to_string(),
        cipher: method.to_string(),
        ..Default::default()
    };

    let mut plugin_opts = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "plugin" => {
                // SIP002: plugin=name;opt=value;opt=value
                match value.split_once(';') {
                    Some((name, opts)) => {
                        node.plugin = Some(name.to_string());
                        plugin_opts = Some(opts.to_string());
                    }
                    None => node.plugin = Some(value.into_owned()),
                }
            }
            "obfs" => node.obfs = Some(value.into_owned()),
            "obfs-host" => node.obfs_host = Some(value.into_owned()),
            _ => {
                node.params.insert(key.into_owned(), value.into_owned());
            }
        }
    }

    if let Some(opts) = plugin_opts {
        for opt in opts.split(';') {
            match opt.split_once('=') {
                Some(("obfs", mode)) if node.obfs.is_none() => node.obfs = Some(mode.to_string()),
                Some(("obfs-host", host)) if node.obfs_host.is_none() => {
                    node.obfs_host = Some(host.to_string())
                }
                _ => {}
            }
        }
    }

    if node.plugin.as_deref() == Some("") {
        node.plugin = None;
    }

    Ok(node)
}
