mod client;
mod config;
mod decode;
mod error;
mod identity_provider;
mod interest_repository;
mod opportunity_repository;
mod opportunity_row;
mod query;
mod saved_opportunity_repository;
mod user_repository;

pub use client::*;
pub use config::*;
pub use decode::*;
pub use error::*;
pub use identity_provider::*;
pub use interest_repository::*;
pub use opportunity_repository::*;
pub use opportunity_row::*;
pub use query::*;
pub use saved_opportunity_repository::*;
pub use user_repository::*;
