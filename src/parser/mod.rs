pub mod explodes;
pub mod node_manip;
pub mod parse_settings;
pub mod subparser;

pub use node_manip::{enrich_node, node_name};
pub use parse_settings::ParseSettings;
pub use subparser::{DecodeFailure, DecodeReport, SubParser};
