//! Core building blocks for sidgate.
//!
//! This crate provides:
//! - `Configuration` - Sectioned `key = value` config files with a declared schema
//! - `AccountAuthenticator` - Trait for trading an OAuth code for an account id
//! - `UserDirectory` - Filesystem mapping from account ids to local users

pub mod config;
pub mod traits;
pub mod users;

pub use config::{Configuration, ParseError};
pub use traits::{AccountAuthenticator, AuthError};
pub use users::UserDirectory;
