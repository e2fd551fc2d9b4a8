//! # Admin API
//!
//! Back-office endpoints, nested under `/api/admin` behind
//! [`super::session::require_admin`].

use super::AppState;
use super::error::ApiError;
use super::payments::{notify_in_background, recipient};
use super::session::CurrentUser;
use crate::clock;
use crate::files::{Bucket, content_type, product_object_name};
use crate::notify::Delivery;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use jeason_core::{
    ApplicationStatus, BankAccount, BankAccountDraft, Career, CareerApplication, CareerDraft,
    PaymentStatus, Product, ProductDraft, QuoteRequest, QuoteStatus, Summary, Transaction,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        // Catalog
        .route("/products", post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .route("/uploads/products", post(upload_product_image))
        // Careers
        .route("/careers", post(create_career))
        .route("/careers/{id}", put(update_career).delete(delete_career))
        .route("/applications", get(list_applications))
        .route("/applications/{id}", patch(set_application_status))
        // Quotes
        .route("/quotes", get(list_quotes))
        .route(
            "/quotes/{id}",
            get(get_quote).patch(set_quote_status).delete(delete_quote),
        )
        // Payments
        .route("/bank-accounts", get(list_bank_accounts).post(create_bank_account))
        .route("/bank-accounts/{id}", patch(set_bank_account_active))
        .route("/transactions", get(list_transactions))
        .route("/transactions/{id}", get(get_transaction))
        .route("/transactions/{id}/verify", post(verify_transaction))
        .route("/transactions/{id}/notify", post(notify_transaction))
        .route("/files/payment_proofs/{*path}", get(proof_file))
}

async fn summary(State(state): State<AppState>) -> Result<Json<Summary>, ApiError> {
    Ok(Json(state.office.summary()?))
}

// =============================================================================
// CATALOG
// =============================================================================

async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(draft) = payload?;
    let product = state.office.create_product(draft, clock::now())?;
    info!(product = product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(draft) = payload?;
    Ok(Json(state.office.update_product(id, draft, clock::now())?))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.office.delete_product(id)?;
    info!(product = id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub ext: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Object path inside the bucket.
    pub path: String,
    /// Public URL to store on the product.
    pub url: String,
}

async fn upload_product_image(
    State(state): State<AppState>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let Query(query) = query?;
    let ext = Bucket::Products.check_extension(query.ext.as_deref().unwrap_or_default())?;
    let object = product_object_name(&uuid::Uuid::new_v4(), &ext);
    state.files.put(Bucket::Products, &object, &body).await?;
    let url = format!(
        "{}/files/products/{object}",
        state.config.public_url.trim_end_matches('/')
    );
    info!(object = %object, bytes = body.len(), "product image uploaded");
    Ok((StatusCode::CREATED, Json(UploadResponse { path: object, url })))
}

// =============================================================================
// CAREERS
// =============================================================================

async fn create_career(
    State(state): State<AppState>,
    payload: Result<Json<CareerDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Career>), ApiError> {
    let Json(draft) = payload?;
    let career = state.office.create_career(draft, clock::now())?;
    info!(career = career.id, "career created");
    Ok((StatusCode::CREATED, Json(career)))
}

async fn update_career(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<CareerDraft>, JsonRejection>,
) -> Result<Json<Career>, ApiError> {
    let Json(draft) = payload?;
    Ok(Json(state.office.update_career(id, draft, clock::now())?))
}

async fn delete_career(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.office.delete_career(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<CareerApplication>>, ApiError> {
    Ok(Json(state.office.list_applications()?))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate<S> {
    pub status: S,
}

async fn set_application_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<StatusUpdate<ApplicationStatus>>, JsonRejection>,
) -> Result<Json<CareerApplication>, ApiError> {
    let Json(update) = payload?;
    let application = state
        .office
        .set_application_status(id, update.status, clock::now())?;
    info!(application = id, status = application.status.as_str(), "application reviewed");
    Ok(Json(application))
}

// =============================================================================
// QUOTES
// =============================================================================

async fn list_quotes(State(state): State<AppState>) -> Result<Json<Vec<QuoteRequest>>, ApiError> {
    Ok(Json(state.office.list_quotes()?))
}

async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<QuoteRequest>, ApiError> {
    Ok(Json(state.office.quote(id)?))
}

async fn set_quote_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<StatusUpdate<QuoteStatus>>, JsonRejection>,
) -> Result<Json<QuoteRequest>, ApiError> {
    let Json(update) = payload?;
    let quote = state.office.set_quote_status(id, update.status, clock::now())?;
    info!(quote = id, status = quote.status.as_str(), "quote request closed");
    Ok(Json(quote))
}

async fn delete_quote(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.office.delete_quote(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// PAYMENTS
// =============================================================================

async fn list_bank_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BankAccount>>, ApiError> {
    Ok(Json(state.office.list_bank_accounts(false)?))
}

async fn create_bank_account(
    State(state): State<AppState>,
    payload: Result<Json<BankAccountDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<BankAccount>), ApiError> {
    let Json(draft) = payload?;
    Ok((StatusCode::CREATED, Json(state.office.create_bank_account(draft)?)))
}

#[derive(Debug, Deserialize)]
pub struct ActiveUpdate {
    pub is_active: bool,
}

async fn set_bank_account_active(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<ActiveUpdate>, JsonRejection>,
) -> Result<Json<BankAccount>, ApiError> {
    let Json(update) = payload?;
    Ok(Json(state.office.set_bank_account_active(id, update.is_active)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub status: Option<String>,
}

async fn list_transactions(
    State(state): State<AppState>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let Query(query) = query?;
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            PaymentStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown payment status: {raw}")))?,
        ),
        None => None,
    };
    Ok(Json(state.office.list_transactions(status)?))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, ApiError> {
    Ok(Json(state.office.transaction(&id)?))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub approved: bool,
}

async fn verify_transaction(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<Transaction>, ApiError> {
    let Json(request) = payload?;
    let transaction = state
        .office
        .verify_transaction(&id, request.approved, admin.id, clock::now())?;
    info!(
        transaction = %id,
        admin = admin.id,
        status = transaction.payment_status.as_str(),
        "transaction verified"
    );
    notify_in_background(&state, transaction.clone());
    Ok(Json(transaction))
}

async fn notify_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let transaction = state.office.transaction(&id)?;
    let to = recipient(&state, &transaction);
    let delivery = match state.notifier.payment_status(&transaction, to.as_deref()).await {
        Ok(delivery) => delivery,
        Err(err) => {
            warn!(transaction = %id, "payment notification failed: {err}");
            return Err(ApiError::Notification(format!("notification for {id}: {err}")));
        }
    };
    Ok(Json(json!({ "delivery": delivery, "sent": delivery == Delivery::Sent })))
}

async fn proof_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.files.get(Bucket::PaymentProofs, &path).await?;
    Ok(([(CONTENT_TYPE, content_type(&path))], bytes).into_response())
}
