pub mod clash;
pub mod common;
pub mod ss;
pub mod ssr;
pub mod vmess;

pub use clash::explode_clash;
pub use common::{explode, link_kind, LinkKind};
pub use ss::explode_ss;
pub use ssr::explode_ssr;
pub use vmess::explode_vmess;
