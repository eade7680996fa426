//! Country lookup for proxy servers backed by a MaxMind GeoIP2 database.

use std::net::{IpAddr, ToSocketAddrs};
use std::path::Path;

use log::{debug, warn};
use maxminddb::{geoip2, MaxMindDBError, Reader};

use crate::error::{Error, Result};

/// Default locale for country names.
pub const DEFAULT_LANG: &str = "zh-CN";

/// Resolves the country a proxy server is located in.
pub trait CountryLookup {
    /// Human-readable country name for `server`, which may be a hostname or
    /// a literal IP address. Never fails; unknown servers map to a sentinel.
    fn country_of(&self, server: &str) -> String;
}

/// Sentinel used when no country can be determined.
pub fn unknown_country(lang: &str) -> &'static str {
    if lang.to_ascii_lowercase().starts_with("zh") {
        "未知"
    } else {
        "Unknown"
    }
}

/// Literal IP, or the first address a hostname resolves to.
pub fn resolve_host(server: &str) -> Option<IpAddr> {
    let server = server.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = server.parse::<IpAddr>() {
        return Some(ip);
    }
    match (server, 0).to_socket_addrs() {
        Ok(mut addrs) => addrs.next().map(|addr| addr.ip()),
        Err(e) => {
            debug!("failed to resolve {}: {}", server, e);
            None
        }
    }
}

/// GeoIP2/GeoLite2 Country database reader.
pub struct GeoIpCountry {
    reader: Reader<Vec<u8>>,
    lang: String,
}

impl GeoIpCountry {
    pub fn open(path: impl AsRef<Path>, lang: &str) -> Result<Self> {
        let path = path.as_ref();
        let reader = Reader::open_readfile(path).map_err(|source| Error::GeoIpOpen {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "loaded GeoIP database {} ({})",
            path.display(),
            reader.metadata.database_type
        );
        Ok(GeoIpCountry {
            reader,
            lang: lang.to_string(),
        })
    }

    /// Localized country name of `ip`. `Ok(None)` when the address is not in
    /// the database or has no name in the configured locale.
    pub fn lookup(&self, ip: IpAddr) -> Result<Option<String>> {
        match self.reader.lookup::<geoip2::Country>(ip) {
            Ok(record) => Ok(record
                .country
                .and_then(|country| country.names)
                .and_then(|names| names.get(self.lang.as_str()).map(|name| name.to_string()))
                .filter(|name| !name.is_empty())),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(None),
            Err(e) => Err(Error::GeoIpLookup(e)),
        }
    }
}

impl CountryLookup for GeoIpCountry {
    fn country_of(&self, server: &str) -> String {
        let unknown = unknown_country(&self.lang);
        let Some(ip) = resolve_host(server) else {
            return unknown.to_string();
        };
        match self.lookup(ip) {
            Ok(Some(country)) => country,
            Ok(None) => unknown.to_string(),
            Err(e) => {
                warn!("country lookup for {} ({}) failed: {}", server, ip, e);
                unknown.to_string()
            }
        }
    }
}
