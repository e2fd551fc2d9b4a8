//! # Pages
//!
//! Serves the single-page app shell for every known page and enforces the
//! page guard: protected pages send anonymous visitors to
//! `/auth?next=<path>` with a `303 See Other`.

use super::AppState;
use super::error::ApiError;
use super::session;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use jeason_core::CoreError;
use jeason_core::routes::{Access, Page, guard};
use tracing::{debug, warn};

pub fn routes() -> Router<AppState> {
    Page::ALL
        .into_iter()
        .fold(Router::new(), |router, page| {
            let pattern = page.pattern().replace(":id", "{id}");
            router.route(&pattern, get(page_shell))
        })
}

fn shell(page: Page) -> Html<String> {
    Html(format!(
        "<!doctype html>\
         <html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>Jeason Steel</title></head>\
         <body><div id=\"root\" data-page=\"{:?}\"></div>\
         <script type=\"module\" src=\"/assets/app.js\"></script></body></html>",
        page
    ))
}

async fn page_shell(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let role = match session::resolve(&state, &headers) {
        Ok(account) => account.map(|a| a.role),
        Err(ApiError::Core(CoreError::Unauthorized(_))) => None,
        Err(err) => return Err(err),
    };
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());

    match guard(&target, role) {
        Access::Allow(page) => Ok(shell(page).into_response()),
        Access::RedirectToLogin { location } => {
            debug!(path = %target, "redirecting anonymous visitor to login");
            Ok(Redirect::to(&location).into_response())
        }
        Access::Forbidden => {
            warn!(path = %target, "signed-in customer refused admin page");
            Err(ApiError::Core(CoreError::Forbidden(
                "Admin access required".to_string(),
            )))
        }
        Access::NotFound => Ok((StatusCode::NOT_FOUND, "Page not found").into_response()),
    }
}
