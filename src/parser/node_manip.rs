use crate::models::{Proxy, ProxyRecord};
use crate::utils::geoip::CountryLookup;

/// Display name in the form `<country>_<type>_<server>:<port>`.
pub fn node_name(country: &str, record: &ProxyRecord) -> String {
    format!(
        "{}_{}_{}:{}",
        country,
        record.type_name(),
        record.server(),
        record.port()
    )
}

/// Attach a country-based display name to a freshly decoded record.
pub fn enrich_node(record: ProxyRecord, countries: &dyn CountryLookup) -> Proxy {
    let country = countries.country_of(record.server());
    Proxy {
        name: node_name(&country, &record),
        record,
    }
}
