//! # HTTP API
//!
//! axum router for the storefront, the admin back-office and the guarded
//! admin pages.
//!
//! ## Route families
//!
//! | Family            | Guard                          |
//! |-------------------|--------------------------------|
//! | catalog, careers, bank accounts, cart, files | none |
//! | quote, application, payment submissions | global rate limit |
//! | sign-up, sign-in  | credential rate limit          |
//! | sign-out, change-password, proof upload | [`session::require_session`] |
//! | `/api/admin/*`    | [`session::require_admin`]     |
//! | admin pages       | login redirect ([`pages`])     |

pub mod admin;
pub mod auth;
pub mod careers;
pub mod catalog;
pub mod error;
pub mod files;
pub mod pages;
pub mod payments;
pub mod quotes;
pub mod session;

use crate::config::ServerConfig;
use crate::files::FileStore;
use crate::gateway::PaymentGateway;
use crate::notify::Notifier;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use error::ApiError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use jeason_core::Backoffice;
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// =============================================================================
// STATE
// =============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub office: Backoffice,
    pub config: Arc<ServerConfig>,
    pub gateway: Arc<PaymentGateway>,
    pub notifier: Arc<Notifier>,
    pub files: Arc<FileStore>,
    pub limiter: Arc<DefaultDirectRateLimiter>,
    /// Separate quota for password attempts.
    pub auth_limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    /// Wire up the outbound clients and the file store from `config`.
    ///
    /// Fails only if an HTTP client cannot be built (no TLS backend).
    pub fn new(office: Backoffice, config: ServerConfig) -> Result<Self, reqwest::Error> {
        let gateway = PaymentGateway::new(
            config.flutterwave_url.clone(),
            config.flutterwave_secret.clone(),
        )?;
        let notifier = Notifier::new(
            config.email_api_url.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
        )?;
        Ok(Self {
            office,
            gateway: Arc::new(gateway),
            notifier: Arc::new(notifier),
            files: Arc::new(FileStore::new(config.files_dir.clone())),
            limiter: Arc::new(per_minute_limiter(config.submissions_per_minute)),
            auth_limiter: Arc::new(per_minute_limiter(config.auth_attempts_per_minute)),
            config: Arc::new(config),
        })
    }
}

fn per_minute_limiter(per_minute: u32) -> DefaultDirectRateLimiter {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_minute(per_minute))
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the complete router.
pub fn create_router(state: AppState) -> Router {
    let limited = Router::new()
        .merge(quotes::routes())
        .merge(careers::submission_routes())
        .merge(payments::submission_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let credentials = auth::credential_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth_rate_limit,
    ));

    let signed_in = Router::new()
        .merge(auth::session_routes())
        .merge(payments::session_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    let admin = admin::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        session::require_admin,
    ));

    let public = Router::new()
        .route("/health", get(health))
        .merge(catalog::routes())
        .merge(careers::routes())
        .merge(payments::routes())
        .merge(auth::routes())
        .merge(files::routes())
        .merge(pages::routes());

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    Router::new()
        .merge(public)
        .merge(limited)
        .merge(credentials)
        .merge(signed_in)
        .nest("/api/admin", admin)
        .layer(layers)
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {o}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

/// Global quota on public form submissions.
async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.limiter.check().is_err() {
        warn!(path = %req.uri().path(), "submission rate limit hit");
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(req).await)
}

/// Quota on sign-up and sign-in, kept apart from form submissions.
async fn auth_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.auth_limiter.check().is_err() {
        warn!(path = %req.uri().path(), "credential rate limit hit");
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(req).await)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// SERVER
// =============================================================================

/// Bind and serve until Ctrl-C or SIGTERM.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let address = state.config.bind_addr();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
