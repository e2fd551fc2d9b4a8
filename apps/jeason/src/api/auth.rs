//! # Auth Endpoints
//!
//! Sign-up, sign-in, token refresh, sign-out and password change.
//!
//! Every grant is returned in the body and also set as the `jeason_session`
//! cookie so the guarded pages work from a plain browser navigation.

use super::AppState;
use super::error::ApiError;
use super::session::{CurrentUser, session_cookie, session_token};
use crate::clock;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jeason_core::auth::{ACCESS_TTL_SECS, PasswordChange, Profile, SessionGrant, TokenPair};
use jeason_core::routes::login_redirect_target;
use jeason_core::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/auth/refresh", post(refresh))
}

/// Password attempts. Rate-limited.
pub fn credential_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
}

/// Signed-in only.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/auth/change-password", post(change_password))
}

// =============================================================================
// RANDOMNESS
// =============================================================================

/// 32 random bytes, base64url without padding.
#[must_use]
pub fn new_token() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

#[must_use]
pub fn new_token_pair() -> TokenPair {
    TokenPair {
        access: new_token(),
        refresh: new_token(),
    }
}

#[must_use]
pub fn new_salt() -> [u8; 16] {
    rand::random()
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Page the user was headed to before being sent to log in.
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    #[serde(flatten)]
    pub grant: SessionGrant,
    pub redirect_to: String,
}

fn with_cookie(status: StatusCode, grant: &SessionGrant, body: impl Serialize) -> Response {
    let cookie = session_cookie(Some(&grant.access_token), ACCESS_TTL_SECS);
    (status, [(SET_COOKIE, cookie)], Json(body)).into_response()
}

async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(credentials) = payload?;
    let now = clock::now();
    let account = state
        .office
        .sign_up(&credentials.email, &credentials.password, new_salt(), now)?;
    info!(account = account.id, "customer account created");
    let grant = state.office.open_session(&account, new_token_pair(), now)?;
    Ok(with_cookie(StatusCode::CREATED, &grant, &grant))
}

async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(credentials) = payload?;
    let grant = state.office.sign_in(
        &credentials.email,
        &credentials.password,
        new_token_pair(),
        clock::now(),
    )?;
    info!(account = grant.user.id, "signed in");
    let redirect_to = login_redirect_target(credentials.next.as_deref());
    let response = SignInResponse {
        grant: grant.clone(),
        redirect_to,
    };
    Ok(with_cookie(StatusCode::OK, &grant, &response))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let grant = state
        .office
        .refresh_session(&request.refresh_token, new_token_pair(), clock::now())?;
    Ok(with_cookie(StatusCode::OK, &grant, &grant))
}

async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<Profile> {
    Json(Profile::from(&user))
}

async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let token = session_token(&headers).ok_or_else(|| {
        ApiError::Core(CoreError::Unauthorized("Please sign in to continue".to_string()))
    })?;
    state.office.sign_out(&token, clock::now())?;
    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, session_cookie(None, 0))],
    )
        .into_response())
}

async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<PasswordChange>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(change) = payload?;
    state
        .office
        .change_password(user.id, &change, new_salt(), clock::now())?;
    info!(account = user.id, "password changed");
    Ok(Json(json!({ "message": "Password updated successfully" })))
}
