//! # Payment Endpoints
//!
//! ## Hosted checkout (`POST /api/payments/initialize`)
//!
//! 1. Reject a missing or zero amount before anything else happens
//! 2. Write one `pending` transaction (guest if the session is unusable)
//! 3. Ask the provider for a checkout link
//! 4. On provider failure mark the transaction `failed` and answer 502
//!
//! ## Bank transfer
//!
//! The customer records the transfer reference, then (signed in) uploads a
//! proof image which an admin reviews. Each upload is stored under a fresh
//! object name and only after the transaction is known to accept it, so a
//! reviewed proof is never replaced on disk.

use super::AppState;
use super::error::ApiError;
use super::session::{CurrentUser, MaybeUser};
use crate::clock;
use crate::files::{Bucket, proof_object_name};
use crate::gateway::CheckoutRequest;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::header::ORIGIN;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use jeason_core::payments::{NewPayment, require_amount, transaction_reference};
use jeason_core::{BankAccount, CustomerDetails, Money, Transaction};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/bank-accounts", get(list_bank_accounts))
}

/// Rate-limited.
pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments/initialize", post(initialize))
        .route("/api/payments/bank-transfer", post(open_bank_transfer))
}

/// Signed-in only.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments/mine", get(my_transactions))
        .route("/api/payments/{id}/proof", put(upload_proof))
}

// =============================================================================
// HOSTED CHECKOUT
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InitializeRequest {
    /// Minor units (kobo).
    pub amount: Option<u64>,
    pub customer: Option<CustomerDetails>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitializeResponse {
    pub payment_link: String,
    pub transaction_id: String,
}

/// `Origin` of the request, else the configured public URL.
fn site_origin(state: &AppState, headers: &HeaderMap) -> String {
    headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| o.starts_with("http://") || o.starts_with("https://"))
        .unwrap_or_else(|| state.config.public_url.trim_end_matches('/'))
        .to_string()
}

async fn initialize(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    headers: HeaderMap,
    payload: Result<Json<InitializeRequest>, JsonRejection>,
) -> Result<Json<InitializeResponse>, ApiError> {
    let Json(request) = payload?;
    let amount = require_amount(request.amount.map(Money))?;

    let reference = transaction_reference(clock::unix_millis(), rand::rng().random_range(0..1000));
    let payment = NewPayment {
        id: uuid::Uuid::new_v4().to_string(),
        amount: Some(amount),
        customer: request.customer,
        user_id: user.as_ref().map(|u| u.id),
    };
    let transaction = state
        .office
        .open_provider_payment(payment, reference.clone(), clock::now())?;

    let mut customer = transaction.customer.clone().unwrap_or_default();
    if customer.email.is_empty() {
        if let Some(account) = &user {
            customer.email = account.email.clone();
        }
    }
    let checkout = CheckoutRequest {
        tx_ref: reference,
        amount,
        currency: transaction.currency.clone(),
        redirect_url: format!("{}/payment/callback", site_origin(&state, &headers)),
        transaction_id: transaction.id.clone(),
        customer,
    };

    match state.gateway.create_payment(&checkout).await {
        Ok(payment_link) => {
            info!(transaction = %transaction.id, tx_ref = %checkout.tx_ref, "checkout opened");
            Ok(Json(InitializeResponse {
                payment_link,
                transaction_id: transaction.id,
            }))
        }
        Err(err) => {
            if let Err(mark) = state.office.mark_transaction_failed(&transaction.id, clock::now()) {
                error!(transaction = %transaction.id, "could not mark transaction failed: {mark}");
            }
            Err(ApiError::Provider(format!(
                "checkout for {} failed: {err}",
                transaction.id
            )))
        }
    }
}

// =============================================================================
// BANK TRANSFER
// =============================================================================

async fn list_bank_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BankAccount>>, ApiError> {
    Ok(Json(state.office.list_bank_accounts(true)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BankTransferRequest {
    pub amount: Option<u64>,
    pub reference: String,
    pub customer: Option<CustomerDetails>,
}

async fn open_bank_transfer(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    payload: Result<Json<BankTransferRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let Json(request) = payload?;
    let payment = NewPayment {
        id: uuid::Uuid::new_v4().to_string(),
        amount: request.amount.map(Money),
        customer: request.customer,
        user_id: user.as_ref().map(|u| u.id),
    };
    let transaction = state
        .office
        .open_bank_transfer(payment, &request.reference, clock::now())?;
    info!(transaction = %transaction.id, "bank transfer recorded");
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProofQuery {
    pub ext: Option<String>,
}

async fn upload_proof(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    query: Result<Query<ProofQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<Transaction>, ApiError> {
    let Query(query) = query?;
    let ext = Bucket::PaymentProofs.check_extension(query.ext.as_deref().unwrap_or_default())?;

    let transaction = state
        .office
        .check_proof_allowed(&id, user.id)
        .inspect_err(|err| warn!(transaction = %id, account = user.id, "proof refused: {err}"))?;

    let object = proof_object_name(user.id, &transaction.id, &uuid::Uuid::new_v4(), &ext);
    state.files.put(Bucket::PaymentProofs, &object, &body).await?;
    let updated = state
        .office
        .attach_payment_proof(&id, user.id, &object, clock::now())?;
    info!(transaction = %id, object = %object, "payment proof uploaded");
    Ok(Json(updated))
}

async fn my_transactions(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let mut transactions = state.office.list_transactions(None)?;
    transactions.retain(|t| t.user_id == Some(user.id));
    Ok(Json(transactions))
}

// =============================================================================
// NOTIFICATION
// =============================================================================

/// Customer email of a transaction, else the payer's account email.
pub(crate) fn recipient(state: &AppState, transaction: &Transaction) -> Option<String> {
    if let Some(email) = transaction.customer_email() {
        return Some(email.to_string());
    }
    let user_id = transaction.user_id?;
    match state.office.account_by_id(user_id) {
        Ok(account) => Some(account.email),
        Err(err) => {
            warn!(transaction = %transaction.id, "no account for payer {user_id}: {err}");
            None
        }
    }
}

/// Send the status email without holding up the response.
pub(crate) fn notify_in_background(state: &AppState, transaction: Transaction) {
    let to = recipient(state, &transaction);
    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        if let Err(err) = notifier.payment_status(&transaction, to.as_deref()).await {
            warn!(transaction = %transaction.id, "payment notification failed: {err}");
        }
    });
}
