//! Public file downloads.

use super::AppState;
use super::error::ApiError;
use crate::files::{Bucket, content_type};
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new().route("/files/products/{*path}", get(product_file))
}

async fn product_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.files.get(Bucket::Products, &path).await?;
    Ok((
        [
            (CONTENT_TYPE, content_type(&path)),
            (CACHE_CONTROL, "public, max-age=86400"),
        ],
        bytes,
    )
        .into_response())
}
