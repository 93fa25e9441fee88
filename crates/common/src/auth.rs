mod config;
mod login;
mod test_accounts;
mod traits;

pub use config::*;
pub use login::*;
pub use test_accounts::*;
pub use traits::*;
