use crate::utils::http::ProxyConfig;

/// Default cap on nested subscription links
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Controls the behavior of the parsing pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSettings {
    /// Proxy to use for downloading subscriptions
    pub proxy: ProxyConfig,

    /// How many levels of subscription links may be followed
    pub max_depth: usize,
}

impl Default for ParseSettings {
    fn default() -> Self {
        ParseSettings {
            proxy: ProxyConfig::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
