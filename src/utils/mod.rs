pub mod base64;
pub mod file;
pub mod geoip;
pub mod http;
pub mod url;

pub use file::{read_file, write_file};
