use std::collections::HashSet;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::models::Proxy;
use crate::parser::explodes::{explode, explode_clash, link_kind, LinkKind};
use crate::parser::node_manip::enrich_node;
use crate::parser::parse_settings::ParseSettings;
use crate::utils::base64::decode_envelope;
use crate::utils::geoip::CountryLookup;
use crate::utils::http::SubscriptionFetcher;

/// A token or subscription entry that could not be turned into a proxy.
#[derive(Debug)]
pub struct DecodeFailure {
    /// The offending link, or `<subscription>#proxies[<index>]` for an
    /// imported Clash entry
    pub source: String,
    pub error: Error,
}

/// Outcome of a run: decoded proxies in input order plus per-item failures.
#[derive(Debug, Default)]
pub struct DecodeReport {
    pub proxies: Vec<Proxy>,
    pub failures: Vec<DecodeFailure>,
}

impl DecodeReport {
    fn fail(&mut self, source: impl Into<String>, error: Error) {
        let source = source.into();
        debug!("failed to parse {}: {}", source, error);
        self.failures.push(DecodeFailure { source, error });
    }
}

/// Turns input documents into proxies, following subscription links.
pub struct SubParser<'a> {
    settings: &'a ParseSettings,
    countries: &'a dyn CountryLookup,
    fetcher: &'a dyn SubscriptionFetcher,
    visited: HashSet<String>,
}

impl<'a> SubParser<'a> {
    pub fn new(
        settings: &'a ParseSettings,
        countries: &'a dyn CountryLookup,
        fetcher: &'a dyn SubscriptionFetcher,
    ) -> Self {
        SubParser {
            settings,
            countries,
            fetcher,
            visited: HashSet::new(),
        }
    }

    /// Parse a document: a whitespace-separated list of links, optionally
    /// wrapped in base64, or a Clash YAML document with a `proxies` list.
    pub fn parse(&mut self, content: &str) -> DecodeReport {
        let mut report = DecodeReport::default();
        self.add_document(content, "input", 0, &mut report);
        info!(
            "parsed {} proxies, {} failures",
            report.proxies.len(),
            report.failures.len()
        );
        report
    }

    fn add_document(&mut self, content: &str, source: &str, depth: usize, report: &mut DecodeReport) {
        let decoded = decode_envelope(content);
        if decoded.is_some() {
            debug!("{}: decoded base64 envelope", source);
        }
        let content = decoded.as_deref().unwrap_or(content);

        match explode_clash(content) {
            Some(entries) => {
                debug!("{}: clash document with {} proxies", source, entries.len());
                for (index, entry) in entries.into_iter().enumerate() {
                    match entry {
                        Ok(proxy) => report.proxies.push(proxy),
                        Err(e) => report.fail(format!("{}#proxies[{}]", source, index), e.into()),
                    }
                }
            }
            None => self.add_links(content, depth, report),
        }
    }

    fn add_links(&mut self, content: &str, depth: usize, report: &mut DecodeReport) {
        for token in content.split_whitespace() {
            match link_kind(token) {
                LinkKind::Proxy(_) => match explode(token) {
                    Ok(record) => report.proxies.push(enrich_node(record, self.countries)),
                    Err(e) => report.fail(token, e.into()),
                },
                LinkKind::Subscription => {
                    if let Err(e) = self.add_subscription(token, depth + 1, report) {
                        report.fail(token, e);
                    }
                }
                LinkKind::Unknown => debug!("skipping unrecognized token {}", token),
            }
        }
    }

    fn add_subscription(&mut self, url: &str, depth: usize, report: &mut DecodeReport) -> Result<()> {
        if depth > self.settings.max_depth {
            return Err(Error::DepthExceeded(self.settings.max_depth));
        }
        if !self.visited.insert(url.to_string()) {
            return Err(Error::AlreadyVisited(url.to_string()));
        }

        info!("downloading subscription {}", url);
        let content = self.fetcher.fetch(url)?;
        self.add_document(&content, url, depth, report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::ProxyRecord;
    use crate::utils::base64::base64_encode;

    struct Fixed;

    impl CountryLookup for Fixed {
        fn country_of(&self, _server: &str) -> String {
            "XX".to_string()
        }
    }

    #[derive(Default)]
    struct MapFetcher(HashMap<String, String>);

    impl SubscriptionFetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| Error::ProxyAddress(format!("no route to {}", url)))
        }
    }

    const SS_LINK: &str = "ss://YWVzLTI1Ni1nY206VGhpcyBpcyBhIFRlc3RAMTI3LjAuMC4xOjEwMDg2";

    #[test]
    fn test_parse_plain_list() {
        let settings = ParseSettings::default();
        let fetcher = MapFetcher::default();
        let mut parser = SubParser::new(&settings, &Fixed, &fetcher);

        let report = parser.parse(&format!("{}\n  trojan://x@y:1 {}", SS_LINK, SS_LINK));
        assert_eq!(report.proxies.len(), 2);
        assert!(report.failures.is_empty());
        assert_eq!(report.proxies[0].name, "XX_ss_127.0.0.1:10086");
    }

    #[test]
    fn test_parse_envelope() {
        let settings = ParseSettings::default();
        let fetcher = MapFetcher::default();
        let mut parser = SubParser::new(&settings, &Fixed, &fetcher);

        let report = parser.parse(&base64_encode(&format!("{}\n", SS_LINK)));
        assert_eq!(report.proxies.len(), 1);
    }

    #[test]
    fn test_malformed_token_does_not_stop_batch() {
        let settings = ParseSettings::default();
        let fetcher = MapFetcher::default();
        let mut parser = SubParser::new(&settings, &Fixed, &fetcher);

        let report = parser.parse(&format!("ss://broken {} vmess://%%%", SS_LINK));
        assert_eq!(report.proxies.len(), 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].source, "ss://broken");
        assert_eq!(report.failures[1].source, "vmess://%%%");
    }

    #[test]
    fn test_self_referencing_subscription_terminates() {
        let settings = ParseSettings::default();
        let url = "https://example.com/loop";
        let mut fetcher = MapFetcher::default();
        fetcher
            .0
            .insert(url.to_string(), format!("{}\n{}", SS_LINK, url));
        let mut parser = SubParser::new(&settings, &Fixed, &fetcher);

        let report = parser.parse(url);
        assert_eq!(report.proxies.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, Error::AlreadyVisited(_)));
    }

    #[test]
    fn test_subscription_depth_is_capped() {
        let settings = ParseSettings {
            max_depth: 2,
            ..Default::default()
        };
        let mut fetcher = MapFetcher::default();
        for level in 1..=3 {
            fetcher.0.insert(
                format!("https://example.com/{}", level),
                format!("{} https://example.com/{}", SS_LINK, level + 1),
            );
        }
        let mut parser = SubParser::new(&settings, &Fixed, &fetcher);

        let report = parser.parse("https://example.com/1");
        assert_eq!(report.proxies.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, "https://example.com/3");
        assert!(matches!(report.failures[0].error, Error::DepthExceeded(2)));
    }

    #[test]
    fn test_clash_subscription_is_imported_verbatim() {
        let settings = ParseSettings::default();
        let url = "https://example.com/clash.yaml";
        let mut fetcher = MapFetcher::default();
        fetcher.0.insert(
            url.to_string(),
            "proxies:\n  - {name: mine, type: ss, server: a.com, port: 443, cipher: rc4-md5, password: p}\n  - {name: broken, type: vmess}\n"
                .to_string(),
        );
        let mut parser = SubParser::new(&settings, &Fixed, &fetcher);

        let report = parser.parse(url);
        assert_eq!(report.proxies.len(), 1);
        assert_eq!(report.proxies[0].name, "mine");
        assert!(matches!(report.proxies[0].record, ProxyRecord::Ss(_)));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, format!("{}#proxies[1]", url));
    }

    #[test]
    fn test_failed_download_is_reported() {
        let settings = ParseSettings::default();
        let fetcher = MapFetcher::default();
        let mut parser = SubParser::new(&settings, &Fixed, &fetcher);

        let report = parser.parse(&format!("https://example.com/missing {}", SS_LINK));
        assert_eq!(report.proxies.len(), 1);
        assert_eq!(report.failures.len(), 1);
    }
}
