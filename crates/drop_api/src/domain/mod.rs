pub mod engagement_service;
pub mod fallback;
pub mod filter;
pub mod format;
pub mod listing_loader;
pub mod opportunity_service;
pub mod partition;
pub mod session_mirror;
pub mod snapshot_store;
pub mod user_service;

pub use engagement_service::*;
pub use fallback::*;
pub use filter::*;
pub use format::*;
pub use listing_loader::*;
pub use opportunity_service::*;
pub use partition::*;
pub use session_mirror::*;
pub use snapshot_store::*;
pub use user_service::*;
