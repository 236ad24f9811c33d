//! Google OAuth2 account verification.
//!
//! Trades an authorization code for an access token, then asks the userinfo
//! endpoint which account the token belongs to.

use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use sidgate_core::{AccountAuthenticator, AuthError};

/// Google token endpoint.
pub const TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";

/// Google userinfo endpoint.
pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo";

/// OAuth client credentials.
#[derive(Debug, Clone, Default)]
pub struct GoogleClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Token endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: f64,
    pub id_token: String,
}

/// Userinfo endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub verified_email: bool,
    pub hd: String,
}

/// Google implementation of [`AccountAuthenticator`].
#[derive(Debug, Clone)]
pub struct GoogleAuthenticator {
    client: reqwest::Client,
    config: GoogleClientConfig,
    token_url: String,
    userinfo_url: String,
}

impl GoogleAuthenticator {
    /// Create an authenticator talking to Google's public endpoints.
    #[must_use]
    pub fn new(config: GoogleClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }
    }

    /// Point the authenticator at different endpoints.
    #[must_use]
    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    /// Run the full exchange and return the verified user info.
    ///
    /// # Errors
    /// Returns error if either request fails, a response cannot be decoded,
    /// or Google does not report an account id.
    pub async fn user_info(&self, code: &str) -> Result<UserInfo, AuthError> {
        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        let token: TokenResponse = decode(resp, &self.token_url).await?;

        let resp = self
            .client
            .get(&self.userinfo_url)
            .query(&[("access_token", token.access_token.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        let info: UserInfo = decode(resp, &self.userinfo_url).await?;

        if info.id.is_empty() {
            return Err(AuthError::Rejected("Authentication Failed".to_string()));
        }

        tracing::debug!(id = %info.id, email = %info.email, "Google account verified");
        Ok(info)
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response, endpoint: &str) -> Result<T, AuthError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(AuthError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| AuthError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl AccountAuthenticator for GoogleAuthenticator {
    fn provider(&self) -> &str {
        "google"
    }

    async fn authenticate(&self, code: &str) -> Result<String, AuthError> {
        self.user_info(code).await.map(|info| info.id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Form, Json, Router,
        extract::Query,
        http::StatusCode,
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use tokio_test::assert_ok;

    use super::*;

    async fn token(Form(form): Form<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
        let field = |name: &str| form.get(name).map(String::as_str);
        if field("grant_type") != Some("authorization_code")
            || field("client_id") != Some("cid")
            || field("client_secret") != Some("swordfish")
            || field("redirect_uri") != Some("https://example.com/app/@/auth")
        {
            return Err(StatusCode::UNAUTHORIZED);
        }
        match field("code") {
            None | Some("bad") => Err(StatusCode::BAD_REQUEST),
            Some("garbage") => Ok(Json(json!("not an object"))),
            Some(code) => Ok(Json(json!({
                "access_token": format!("at-{code}"),
                "token_type": "Bearer",
                "expires_in": 3599,
            }))),
        }
    }

    async fn userinfo(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
        match query.get("access_token").map(String::as_str) {
            Some("at-good") => Json(json!({
                "id": "1234",
                "email": "alice@example.com",
                "verified_email": true,
            })),
            _ => Json(json!({ "email": "nobody@example.com" })),
        }
    }

    async fn mock_google() -> String {
        let app = Router::new()
            .route("/token", post(token))
            .route("/userinfo", get(userinfo));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn authenticator(base: &str) -> GoogleAuthenticator {
        GoogleAuthenticator::new(GoogleClientConfig {
            client_id: "cid".to_string(),
            client_secret: "swordfish".to_string(),
            redirect_uri: "https://example.com/app/@/auth".to_string(),
        })
        .with_endpoints(format!("{base}/token"), format!("{base}/userinfo"))
    }

    #[tokio::test]
    async fn test_successful_exchange() {
        let base = mock_google().await;
        let google = authenticator(&base);

        let info = assert_ok!(google.user_info("good").await);
        assert_eq!(info.id, "1234");
        assert_eq!(info.email, "alice@example.com");
        assert!(info.verified_email);
        assert_eq!(info.hd, "");

        assert_eq!(google.provider(), "google");
        assert_eq!(assert_ok!(google.authenticate("good").await), "1234");
    }

    #[tokio::test]
    async fn test_missing_id_is_rejected() {
        let base = mock_google().await;
        let err = authenticator(&base)
            .authenticate("someone-else")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Rejected(_)));
        assert_eq!(err.to_string(), "Authentication Failed");
    }

    #[tokio::test]
    async fn test_token_endpoint_error_status() {
        let base = mock_google().await;
        let err = authenticator(&base).authenticate("bad").await.unwrap_err();
        assert!(matches!(err, AuthError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_wrong_credentials() {
        let base = mock_google().await;
        let google = GoogleAuthenticator::new(GoogleClientConfig::default())
            .with_endpoints(format!("{base}/token"), format!("{base}/userinfo"));
        let err = google.authenticate("good").await.unwrap_err();
        assert!(matches!(err, AuthError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_undecodable_token_response() {
        let base = mock_google().await;
        let err = authenticator(&base)
            .authenticate("garbage")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = format!("http://{addr}");
        let err = authenticator(&base).authenticate("good").await.unwrap_err();
        assert!(matches!(err, AuthError::Request(_)));
    }

    #[test]
    fn test_userinfo_defaults() {
        let info: UserInfo = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert!(info.id.is_empty());
        assert!(!info.verified_email);
    }
}
