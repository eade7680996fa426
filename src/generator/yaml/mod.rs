pub mod clash;

pub use clash::proxies_to_yaml;
