//! Login, logout and session check routes.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use serde::Deserialize;
use sidgate_core::{AccountAuthenticator, UserDirectory, users::account_key};
use sidgate_session::{RegistryError, SessionHandle};
use tower_http::trace::TraceLayer;

use crate::{cookie, debug::debug_handler};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionHandle,
    pub authenticator: Arc<dyn AccountAuthenticator>,
    pub users: UserDirectory,
}

/// Handler error.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    Sessions(#[from] RegistryError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {self}");
        (StatusCode::SERVICE_UNAVAILABLE, format!("{self}\n")).into_response()
    }
}

/// Build the application router.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/app/test", any(debug_handler))
        .route("/app/@/auth", get(login_handler))
        .route("/app/@/logout", get(logout_handler))
        .route("/app/@/check", get(check_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct AuthParams {
    #[serde(default)]
    code: String,
}

async fn login_handler(
    State(state): State<AppState>,
    Query(params): Query<AuthParams>,
) -> Result<Response, WebError> {
    if params.code.is_empty() {
        return Ok(String::new().into_response());
    }

    let account = match state.authenticator.authenticate(&params.code).await {
        Ok(account) => account,
        Err(e) => {
            tracing::warn!("Authentication failed: {e}");
            return Ok(format!("OOPS: {e}\n").into_response());
        }
    };

    let key = account_key(state.authenticator.provider(), &account);
    let uid = state.users.lookup(&key).await;
    let sid = state.sessions.start(&uid).await?;
    tracing::info!(account = %key, uid = %uid, "User logged in");

    Ok((
        [(SET_COOKIE, cookie::session(&sid))],
        format!("Welcome, user '{uid}', session '{sid}'\n"),
    )
        .into_response())
}

/// Token from the request cookie (empty when absent) and its owner, if live.
async fn credentials(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(String, Option<String>), RegistryError> {
    let Some(sid) = cookie::session_token(headers) else {
        return Ok((String::new(), None));
    };
    let uid = state.sessions.lookup(&sid).await?;
    Ok((sid, uid))
}

async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let (sid, uid) = credentials(&state, &headers).await?;

    let body = match uid {
        Some(uid) => {
            state.sessions.end(&sid).await?;
            tracing::info!(uid = %uid, "User logged out");
            format!("Goodbye, user '{uid}'\n")
        }
        None => "Do I know you?".to_string(),
    };

    Ok(([(SET_COOKIE, cookie::expired())], body).into_response())
}

async fn check_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<String, WebError> {
    let (sid, uid) = credentials(&state, &headers).await?;

    Ok(match uid {
        Some(uid) => format!("Your SID is {sid}\nYour UID is {uid}\n"),
        None if !sid.is_empty() => format!("Your SID ({sid}) is invalid or expired\n"),
        None => "You have no SID\n".to_string(),
    })
}
