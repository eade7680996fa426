use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::parser::parse_settings::{ParseSettings, DEFAULT_MAX_DEPTH};
use crate::utils::file::read_file;
use crate::utils::geoip::DEFAULT_LANG;
use crate::utils::http::{parse_proxy, DEFAULT_TIMEOUT};

fn default_db() -> String {
    "Country.mmdb".to_string()
}

fn default_proxy() -> String {
    "socks5://127.0.0.1:1080".to_string()
}

fn default_lang() -> String {
    DEFAULT_LANG.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

/// Run settings, loadable from a TOML file
///
/// ```toml
/// db = "/usr/share/GeoIP/GeoLite2-Country.mmdb"
/// proxy = "NONE"
/// lang = "en"
/// max_depth = 3
/// timeout = 30
/// ```
///
/// Missing keys take their defaults. Command line flags override file values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// GeoIP2 Country database
    #[serde(default = "default_db")]
    pub db: String,
    /// Upstream proxy for subscription downloads, `NONE` to go direct
    #[serde(default = "default_proxy")]
    pub proxy: String,
    /// Locale of country names
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Subscription request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db: default_db(),
            proxy: default_proxy(),
            lang: default_lang(),
            max_depth: default_max_depth(),
            timeout: default_timeout(),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read_file(path)?;
        let settings = toml::from_str(&content).map_err(|source| Error::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn parse_settings(&self) -> ParseSettings {
        ParseSettings {
            proxy: parse_proxy(&self.proxy),
            max_depth: self.max_depth,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
