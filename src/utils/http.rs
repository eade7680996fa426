use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, warn};
use once_cell::unsync::OnceCell;
use reqwest::blocking::Client;
use reqwest::Proxy;
use url::Url;

use crate::error::{Error, Result};

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 15;

/// How long the upstream proxy gets to accept a TCP connection
const PROXY_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

const USER_AGENT: &str = concat!("uri-decoder/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub proxy: Option<String>,
}

/// `""` and `"NONE"` disable the upstream proxy; anything else is used as
/// a proxy URL such as `socks5://127.0.0.1:1080`.
pub fn parse_proxy(proxy_str: &str) -> ProxyConfig {
    let proxy_str = proxy_str.trim();
    if proxy_str.is_empty() || proxy_str.eq_ignore_ascii_case("NONE") {
        return ProxyConfig { proxy: None };
    }
    ProxyConfig {
        proxy: Some(proxy_str.to_string()),
    }
}

/// Downloads subscription content.
pub trait SubscriptionFetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP(S) fetcher, optionally tunnelled through an upstream proxy.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    proxy_config: ProxyConfig,
    timeout: Duration,
    client: OnceCell<Client>,
}

impl HttpFetcher {
    pub fn new(proxy_config: ProxyConfig, timeout: Duration) -> Self {
        HttpFetcher {
            proxy_config,
            timeout,
            client: OnceCell::new(),
        }
    }

    /// Built on first use; the proxy is checked only then.
    fn client(&self) -> Result<&Client> {
        self.client.get_or_try_init(|| self.build_client())
    }

    fn build_client(&self) -> Result<Client> {
        let mut client_builder = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        if let Some(proxy) = &self.proxy_config.proxy {
            if probe_proxy(proxy)? {
                debug!("fetching through proxy {}", proxy);
                client_builder = client_builder.proxy(Proxy::all(proxy.as_str())?);
            } else {
                warn!("proxy {} is not reachable, connecting directly", proxy);
            }
        }

        Ok(client_builder.build()?)
    }
}

impl SubscriptionFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client()?.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status));
        }
        Ok(response.text()?)
    }
}

/// Checks whether the proxy at `proxy_url` accepts TCP connections.
pub fn probe_proxy(proxy_url: &str) -> Result<bool> {
    let address = proxy_address(proxy_url)?;
    let addrs = match address.to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            debug!("cannot resolve proxy {}: {}", address, e);
            return Ok(false);
        }
    };
    Ok(addrs
        .into_iter()
        .any(|addr| TcpStream::connect_timeout(&addr, PROXY_PROBE_TIMEOUT).is_ok()))
}

/// `host:port` of a proxy URL. SOCKS proxies default to port 1080.
pub fn proxy_address(proxy_url: &str) -> Result<String> {
    let url = Url::parse(proxy_url).map_err(|e| Error::ProxyAddress(format!("{}: {}", proxy_url, e)))?;
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| Error::ProxyAddress(format!("{}: missing host", proxy_url)))?;
    let port = match url.port_or_known_default() {
        Some(port) => port,
        None if url.scheme().starts_with("socks") => 1080,
        None => return Err(Error::ProxyAddress(format!("{}: missing port", proxy_url))),
    };
    Ok(format!("{}:{}", host, port))
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn test_parse_proxy() {
        assert_eq!(parse_proxy("").proxy, None);
        assert_eq!(parse_proxy("NONE").proxy, None);
        assert_eq!(
            parse_proxy(" socks5://127.0.0.1:1080 ").proxy.as_deref(),
            Some("socks5://127.0.0.1:1080")
        );
    }

    #[test]
    fn test_proxy_address() {
        assert_eq!(
            proxy_address("socks5://127.0.0.1:1080").unwrap(),
            "127.0.0.1:1080"
        );
        assert_eq!(proxy_address("socks5h://localhost").unwrap(), "localhost:1080");
        assert_eq!(proxy_address("http://proxy.lan").unwrap(), "proxy.lan:80");
        assert_eq!(proxy_address("http://[::1]:8080").unwrap(), "[::1]:8080");
        assert!(matches!(
            proxy_address("127.0.0.1:1080"),
            Err(Error::ProxyAddress(_))
        ));
    }

    #[test]
    fn test_probe_proxy() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(probe_proxy(&format!("socks5://127.0.0.1:{}", port)).unwrap());

        drop(listener);
        assert!(!probe_proxy(&format!("socks5://127.0.0.1:{}", port)).unwrap());
    }

    #[test]
    fn test_client_is_built_once() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let fetcher = HttpFetcher::new(
            parse_proxy(&format!("socks5://127.0.0.1:{}", port)),
            Duration::from_secs(DEFAULT_TIMEOUT),
        );

        let first = fetcher.client().unwrap() as *const Client;
        let second = fetcher.client().unwrap() as *const Client;
        assert_eq!(first, second);

        listener.set_nonblocking(true).unwrap();
        let mut connections = 0;
        loop {
            match listener.accept() {
                Ok(_) => connections += 1,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => panic!("accept failed: {}", e),
            }
        }
        assert_eq!(connections, 1);
    }
}
