//! Error types for link decoding and the conversion pipeline.
//!
//! [`DecodeError`] covers a single malformed link and is always recoverable:
//! the pipeline records it against the offending token and moves on.
//! [`Error`] is the crate-level type; only a few of its variants (no input,
//! unreadable input file, GeoIP database, settings file) end a run.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unsupported link scheme: {0}")]
    UnsupportedScheme(String),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid base64 length {0} (length % 4 == 1)")]
    Base64Length(usize),

    #[error("decoded data is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no input given: use --uri or --ifile")]
    NoInput,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open GeoIP database {path}: {source}")]
    GeoIpOpen {
        path: PathBuf,
        #[source]
        source: maxminddb::MaxMindDBError,
    },

    #[error("GeoIP lookup failed: {0}")]
    GeoIpLookup(#[source] maxminddb::MaxMindDBError),

    #[error("invalid settings file {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid proxy address: {0}")]
    ProxyAddress(String),

    #[error("subscription download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("subscription returned HTTP {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("subscription nesting deeper than {0} levels")]
    DepthExceeded(usize),

    #[error("subscription already visited: {0}")]
    AlreadyVisited(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
