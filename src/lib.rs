pub mod error;
pub mod generator;
pub mod models;
pub mod parser;
pub mod settings;
pub mod utils;

// Re-export the main proxy types for easier access
pub use models::{Proxy, ProxyRecord, ProxyType};

pub use error::{DecodeError, Error, Result};
pub use settings::Settings;
