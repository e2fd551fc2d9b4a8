//! Quote request form endpoint.

use super::AppState;
use super::error::ApiError;
use crate::clock;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use jeason_core::{QuoteDraft, QuoteRequest};
use tracing::info;

/// Rate-limited.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/quotes", post(submit_quote))
}

async fn submit_quote(
    State(state): State<AppState>,
    payload: Result<Json<QuoteDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<QuoteRequest>), ApiError> {
    let Json(draft) = payload?;
    let quote = state.office.submit_quote(draft, clock::now())?;
    info!(quote = quote.id, company = %quote.company, "quote request received");
    Ok((StatusCode::CREATED, Json(quote)))
}
