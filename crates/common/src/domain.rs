mod interest;
mod opportunity;
mod result;
mod saved_opportunity;
mod user;

pub use interest::*;
pub use opportunity::*;
pub use result::*;
pub use saved_opportunity::*;
pub use user::*;
