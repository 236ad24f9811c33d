//! OAuth authorization-code exchange.
//!
//! Provides:
//! - `GoogleAuthenticator` - Google account verification
//! - `GoogleClientConfig` - Client credentials read from the `[google-auth]` section

pub mod google;

pub use google::{GoogleAuthenticator, GoogleClientConfig, TokenResponse, UserInfo};
