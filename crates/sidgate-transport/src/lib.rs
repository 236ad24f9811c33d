//! HTTP transport for sidgate.
//!
//! Provides:
//! - `SID` cookie encoding and extraction
//! - Login, logout and session check routes
//! - A request dump endpoint for debugging proxies

pub mod cookie;
pub mod debug;
pub mod http;

pub use http::{AppState, WebError, create_router};
