pub mod links;
pub mod yaml;

pub use links::{proxy_to_link, ss_link, ssr_link, vmess_link};
pub use yaml::proxies_to_yaml;
