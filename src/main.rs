use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use uri_decoder::generator::proxies_to_yaml;
use uri_decoder::parser::SubParser;
use uri_decoder::utils::file::{read_file, write_file};
use uri_decoder::utils::geoip::GeoIpCountry;
use uri_decoder::utils::http::HttpFetcher;
use uri_decoder::{Error, Result, Settings};

/// Decode ss/ssr/vmess links and subscriptions into a Clash proxy list
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "Options take two dashes, e.g. --uri and --ifile; -uri is rejected."
)]
struct Args {
    /// A link, a whitespace-separated list of links, or a subscription URL,
    /// optionally base64-encoded
    #[arg(long, value_name = "STRING")]
    uri: Option<String>,

    /// Read links from this file instead (raw or base64)
    #[arg(long, value_name = "FILE")]
    ifile: Option<PathBuf>,

    /// Write the YAML block to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// GeoIP2 Country database [default: Country.mmdb]
    #[arg(long, value_name = "FILE")]
    db: Option<String>,

    /// Upstream proxy for subscription downloads, NONE to connect directly
    /// [default: socks5://127.0.0.1:1080]
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Locale of country names [default: zh-CN]
    #[arg(long, value_name = "LOCALE")]
    lang: Option<String>,

    /// How many levels of nested subscriptions to follow [default: 5]
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Subscription request timeout in seconds [default: 15]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// TOML settings file providing defaults for the options above
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(db) = &self.db {
            settings.db = db.clone();
        }
        if let Some(proxy) = &self.proxy {
            settings.proxy = proxy.clone();
        }
        if let Some(lang) = &self.lang {
            settings.lang = lang.clone();
        }
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout = timeout;
        }
        Ok(settings)
    }

    fn input(&self) -> Result<String> {
        match (&self.ifile, &self.uri) {
            (Some(path), _) => read_file(path),
            (None, Some(uri)) => Ok(uri.clone()),
            (None, None) => Err(Error::NoInput),
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let settings = args.settings()?;
    let input = args.input()?;

    let countries = GeoIpCountry::open(&settings.db, &settings.lang)?;
    let parse_settings = settings.parse_settings();
    let fetcher = HttpFetcher::new(parse_settings.proxy.clone(), settings.request_timeout());

    let report = SubParser::new(&parse_settings, &countries, &fetcher).parse(&input);
    for failure in &report.failures {
        warn!("skipped {}: {}", failure.source, failure.error);
    }

    let yaml = proxies_to_yaml(&report.proxies);
    match &args.out {
        Some(path) => {
            write_file(path, &yaml)?;
            info!(
                "wrote {} proxies to {}",
                report.proxies.len(),
                path.display()
            );
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from(["uri-decoder", "--uri", "ss://x", "--lang", "en", "--proxy", "NONE"]);
        let settings = args.settings().unwrap();
        assert_eq!(settings.lang, "en");
        assert_eq!(settings.proxy, "NONE");
        assert_eq!(settings.db, "Country.mmdb");
    }

    #[test]
    fn test_ifile_wins_over_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        std::fs::write(&path, "from-file").unwrap();

        let args = Args::parse_from([
            "uri-decoder",
            "--uri",
            "from-flag",
            "--ifile",
            path.to_str().unwrap(),
        ]);
        assert_eq!(args.input().unwrap(), "from-file");
    }

    #[test]
    fn test_single_dash_long_names_are_rejected() {
        assert!(Args::try_parse_from(["uri-decoder", "-uri", "ss://x"]).is_err());
        assert!(Args::try_parse_from(["uri-decoder", "-ifile", "links.txt"]).is_err());
        assert!(Args::try_parse_from(["uri-decoder", "--uri", "ss://x"]).is_ok());
    }

    #[test]
    fn test_missing_input() {
        let args = Args::parse_from(["uri-decoder"]);
        assert!(matches!(args.input(), Err(Error::NoInput)));
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uri-decoder.toml");
        std::fs::write(&path, "lang = \"en\"\ntimeout = 30\n").unwrap();

        let args = Args::parse_from([
            "uri-decoder",
            "--config",
            path.to_str().unwrap(),
            "--timeout",
            "5",
        ]);
        let settings = args.settings().unwrap();
        assert_eq!(settings.lang, "en");
        assert_eq!(settings.timeout, 5);
    }
}
