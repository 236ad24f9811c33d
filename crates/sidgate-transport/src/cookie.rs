//! Session cookie wire format.

use axum::http::{HeaderMap, header::COOKIE};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "SID";

/// A timestamp long past, used to make browsers drop the cookie.
const EXPIRED_AT: &str = "Thu, 01 Jan 1970 00:00:42 GMT";

/// `Set-Cookie` value that installs `token`.
#[must_use]
pub fn session(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; Secure; HttpOnly")
}

/// `Set-Cookie` value that clears the session cookie.
#[must_use]
pub fn expired() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Expires={EXPIRED_AT}; Secure; HttpOnly")
}

/// Extract the session token from the request's `Cookie` headers.
///
/// The first `SID` pair wins. Surrounding double quotes are stripped.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim_matches('"').to_string())
}
