//! Careers page endpoints.

use super::AppState;
use super::error::ApiError;
use crate::clock;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use jeason_core::{ApplicationDraft, Career, CareerApplication};
use tracing::info;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/careers", get(list_careers))
        .route("/api/careers/{id}", get(get_career))
}

/// Rate-limited.
pub fn submission_routes() -> Router<AppState> {
    Router::new().route("/api/careers/{id}/applications", post(apply))
}

async fn list_careers(State(state): State<AppState>) -> Result<Json<Vec<Career>>, ApiError> {
    Ok(Json(state.office.list_careers()?))
}

async fn get_career(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Career>, ApiError> {
    Ok(Json(state.office.career(id)?))
}

async fn apply(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<ApplicationDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<CareerApplication>), ApiError> {
    let Json(draft) = payload?;
    let application = state.office.apply_for_career(id, draft, clock::now())?;
    info!(
        application = application.id,
        career = id,
        "career application received"
    );
    Ok((StatusCode::CREATED, Json(application)))
}
