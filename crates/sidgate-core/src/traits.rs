//! Core traits for account authentication.

use async_trait::async_trait;
use thiserror::Error;

/// Authentication error.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Rejected(String),
}

/// Trait for identity providers that verify an OAuth authorization code.
#[async_trait]
pub trait AccountAuthenticator: Send + Sync {
    /// Short provider tag used to namespace account ids (e.g. `google`).
    fn provider(&self) -> &str;

    /// Exchange an authorization code for the provider's account id.
    async fn authenticate(&self, code: &str) -> Result<String, AuthError>;
}
