//! Core data models for the application
//!
//! Decoders in [`crate::parser`] produce a [`ProxyRecord`] per link, the
//! pipeline wraps it in a named [`Proxy`], and [`crate::generator`] renders
//! the final list.
//!
//! ```rust
//! use uri_decoder::models::{Proxy, SsProxy};
//!
//! let ss = SsProxy {
//!     server: "127.0.0.1".to_string(),
//!     port: 8388,
//!     ..Default::default()
//! };
//! let proxy = Proxy::new("local", ss);
//! assert_eq!(proxy.record.type_name(), "ss");
//! ```

mod proxy;

pub use proxy::*;
