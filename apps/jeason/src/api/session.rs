//! # Session Middleware
//!
//! Resolves the caller's session from `Authorization: Bearer <token>` or the
//! `jeason_session` cookie, in that order.
//!
//! - [`require_session`]: any signed-in account, else 401
//! - [`require_admin`]: admin accounts only, else 401/403
//! - [`MaybeUser`]: optional; a bad token is logged and treated as a guest

use super::{AppState, error::ApiError};
use crate::clock;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use jeason_core::{Account, CoreError};
use std::convert::Infallible;
use tracing::warn;

/// Cookie carrying the access token for page requests.
pub const SESSION_COOKIE: &str = "jeason_session";

/// The signed-in account, put into request extensions by the middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Account);

/// Access token from the bearer header or the session cookie.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value for a fresh session, or an expired one when `token`
/// is `None`.
#[must_use]
pub fn session_cookie(token: Option<&str>, max_age_secs: u64) -> String {
    match token {
        Some(token) => format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
        ),
        None => format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    }
}

/// The account behind the request's session, if any.
pub fn resolve(state: &AppState, headers: &HeaderMap) -> Result<Option<Account>, ApiError> {
    match session_token(headers) {
        Some(token) => Ok(Some(state.office.resolve_session(&token, clock::now())?)),
        None => Ok(None),
    }
}

fn sign_in_required() -> ApiError {
    ApiError::Core(CoreError::Unauthorized("Please sign in to continue".to_string()))
}

/// Reject requests without a live session.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account = resolve(&state, req.headers())?.ok_or_else(sign_in_required)?;
    req.extensions_mut().insert(CurrentUser(account));
    Ok(next.run(req).await)
}

/// Reject requests that are not from an admin.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account = resolve(&state, req.headers())?.ok_or_else(sign_in_required)?;
    if !account.is_admin() {
        warn!(account = account.id, path = %req.uri().path(), "non-admin hit admin API");
        return Err(ApiError::Core(CoreError::Forbidden(
            "Admin access required".to_string(),
        )));
    }
    req.extensions_mut().insert(CurrentUser(account));
    Ok(next.run(req).await)
}

/// Optional session for endpoints open to guests.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Account>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve(state, &parts.headers) {
            Ok(account) => Ok(MaybeUser(account)),
            Err(err) => {
                warn!("ignoring unusable session token: {err}");
                Ok(MaybeUser(None))
            }
        }
    }
}
