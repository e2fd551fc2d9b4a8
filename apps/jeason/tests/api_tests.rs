//! Integration tests for the HTTP API.
//!
//! Uses axum-test for requests against the router, wiremock for the payment
//! provider and email API, and tempfile for the file store.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::body::Bytes;
use axum::http::header::{COOKIE, ORIGIN};
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use jeason::api::{AppState, create_router};
use jeason::config::ServerConfig;
use jeason_core::storage::Table;
use jeason_core::{
    ApplicationStatus, Backoffice, CareerDraft, Money, PaymentStatus, ProductDraft, QuoteStatus,
    Role, Timestamp,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADMIN_EMAIL: &str = "admin@jeasonsteel.com";
const ADMIN_PASSWORD: &str = "rebar-2024";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

struct Harness {
    server: TestServer,
    office: Backoffice,
    _files: TempDir,
}

fn base_config(files: &TempDir) -> ServerConfig {
    ServerConfig {
        files_dir: files.path().to_path_buf(),
        public_url: "http://jeason.test".to_string(),
        flutterwave_url: "http://127.0.0.1:9".to_string(),
        flutterwave_secret: Some("FLWSECK_TEST-secret".to_string()),
        ..ServerConfig::default()
    }
}

fn harness_with(configure: impl FnOnce(ServerConfig) -> ServerConfig) -> Harness {
    let files = tempfile::tempdir().unwrap();
    let config = configure(base_config(&files));
    let office = Backoffice::in_memory();
    office
        .create_account(ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin, [1; 16], Timestamp(1))
        .unwrap();
    let state = AppState::new(office.clone(), config).unwrap();
    let server = TestServer::new(create_router(state)).unwrap();
    Harness {
        server,
        office,
        _files: files,
    }
}

fn harness() -> Harness {
    harness_with(|config| config)
}

async fn sign_in(h: &Harness, email: &str, password: &str) -> String {
    let response = h
        .server
        .post("/api/auth/sign-in")
        .json(&json!({ "email": email, "password": password }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn admin_token(h: &Harness) -> String {
    sign_in(h, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

async fn customer_token(h: &Harness, email: &str) -> String {
    let response = h
        .server
        .post("/api/auth/sign-up")
        .json(&json!({ "email": email, "password": "customer-pass" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn quote_body() -> Value {
    json!({
        "name": "Chinedu Okafor",
        "email": "chinedu@okaforbuild.ng",
        "phone": "+2348031234567",
        "company": "Okafor Builders",
        "product_details": "16mm high-tensile rebar",
        "quantity": "40 tonnes"
    })
}

fn product_draft(title: &str) -> ProductDraft {
    ProductDraft {
        title: title.to_string(),
        description: "Hot rolled structural steel".to_string(),
        price: Money::from_major(15_000),
        category: "Beams".to_string(),
        ..ProductDraft::default()
    }
}

async fn provider_mock(status: u16, body: Value) -> MockServer {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .and(header("authorization", "Bearer FLWSECK_TEST-secret"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&mock)
        .await;
    mock
}

fn checkout_ok() -> Value {
    json!({
        "status": "success",
        "message": "Hosted Link",
        "data": { "link": "https://checkout.flutterwave.test/pay/abc123" }
    })
}

// =============================================================================
// HEALTH
// =============================================================================

#[tokio::test]
async fn test_health() {
    let h = harness();
    let response = h.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// PUBLIC FORMS
// =============================================================================

#[tokio::test]
async fn test_quote_submission_creates_one_pending_record() {
    let h = harness();
    let response = h.server.post("/api/quotes").json(&quote_body()).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["status"], "pending");

    let quotes = h.office.list_quotes().unwrap();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].status, QuoteStatus::Pending);
    assert_eq!(quotes[0].company, "Okafor Builders");
}

#[tokio::test]
async fn test_quote_missing_field_is_rejected_without_write() {
    let h = harness();
    let mut body = quote_body();
    body["quantity"] = json!("   ");
    let response = h.server.post("/api/quotes").json(&body).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["error"], "Quantity is required");
    assert_eq!(error["fields"]["quantity"], "Quantity is required");
    assert_eq!(h.office.count(Table::QuoteRequests).unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let h = harness();
    let response = h
        .server
        .post("/api/quotes")
        .content_type("application/json")
        .bytes(Bytes::from_static(b"{not json"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(h.office.count(Table::QuoteRequests).unwrap(), 0);
}

#[tokio::test]
async fn test_career_application_takes_position_from_career() {
    let h = harness();
    let career = h
        .office
        .create_career(
            CareerDraft {
                title: "Quality Inspector".to_string(),
                department: "Quality".to_string(),
                location: "Lagos".to_string(),
                employment_type: "Full-time".to_string(),
                description: "Inspect incoming coils and test certificates".to_string(),
            },
            Timestamp(1),
        )
        .unwrap();

    let listed: Value = h.server.get("/api/careers").await.json();
    assert_eq!(listed[0]["type"], "Full-time");

    let response = h
        .server
        .post(&format!("/api/careers/{}/applications", career.id))
        .json(&json!({
            "name": "Aisha Bello",
            "email": "aisha@example.com",
            "phone": "08030000000",
            "experience": "4 years NDT inspection"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let application: Value = response.json();
    assert_eq!(application["position"], "Quality Inspector");
    assert_eq!(application["status"], "pending");
    assert_eq!(application["resume_url"], Value::Null);

    let missing = h
        .server
        .post("/api/careers/999/applications")
        .json(&json!({
            "name": "Aisha Bello",
            "email": "aisha@example.com",
            "phone": "08030000000",
            "experience": "4 years"
        }))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_submissions_are_rate_limited() {
    let h = harness_with(|config| ServerConfig {
        submissions_per_minute: 2,
        ..config
    });
    for _ in 0..2 {
        let ok = h.server.post("/api/quotes").json(&quote_body()).await;
        assert_eq!(ok.status_code(), StatusCode::CREATED);
    }
    let limited = h.server.post("/api/quotes").json(&quote_body()).await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(h.office.count(Table::QuoteRequests).unwrap(), 2);

    // Reads are not limited.
    assert_eq!(h.server.get("/api/products").await.status_code(), StatusCode::OK);
}

// =============================================================================
// CATALOG
// =============================================================================

#[tokio::test]
async fn test_deleted_product_disappears_from_listings() {
    let h = harness();
    let token = admin_token(&h).await;

    for title in ["I-Beam 203", "H-Beam 150"] {
        let created = h
            .server
            .post("/api/admin/products")
            .authorization_bearer(&token)
            .json(&product_draft(title))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);
    }

    let deleted = h
        .server
        .delete("/api/admin/products/1")
        .authorization_bearer(&token)
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    for _ in 0..2 {
        let listed: Vec<Value> = h.server.get("/api/products").await.json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["title"], "H-Beam 150");
    }
    assert_eq!(
        h.server.get("/api/products/1").await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        h.server
            .delete("/api/admin/products/1")
            .authorization_bearer(&token)
            .await
            .status_code(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_category_filter_and_categories() {
    let h = harness();
    h.office.create_product(product_draft("I-Beam"), Timestamp(1)).unwrap();
    let mut pipe = product_draft("Square Pipe");
    pipe.category = "Pipes".to_string();
    h.office.create_product(pipe, Timestamp(2)).unwrap();

    let pipes: Vec<Value> = h
        .server
        .get("/api/products")
        .add_query_param("category", "pipes")
        .await
        .json();
    assert_eq!(pipes.len(), 1);
    assert_eq!(pipes[0]["title"], "Square Pipe");

    let categories: Vec<String> = h.server.get("/api/categories").await.json();
    assert_eq!(categories, vec!["Beams".to_string(), "Pipes".to_string()]);
}

#[tokio::test]
async fn test_cart_total_skips_missing_products() {
    let h = harness();
    h.office.create_product(product_draft("Angle 50"), Timestamp(1)).unwrap();

    let response = h
        .server
        .post("/api/cart/total")
        .json(&json!({ "items": [
            { "product_id": 1, "quantity": 3 },
            { "product_id": 42, "quantity": 1 }
        ]}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let total: Value = response.json();
    assert_eq!(total["total"], Money::from_major(45_000).minor());
    assert_eq!(total["item_count"], 3);
    assert_eq!(total["missing"], json!([42]));
}

#[tokio::test]
async fn test_product_validation_reports_fields() {
    let h = harness();
    let token = admin_token(&h).await;
    let response = h
        .server
        .post("/api/admin/products")
        .authorization_bearer(&token)
        .json(&json!({ "title": "AB", "price": 0, "description": "short", "category": "B" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["fields"]["title"], "Title must be at least 3 characters");
    assert_eq!(body["fields"]["price"], "Price must be positive");
    assert_eq!(h.office.count(Table::Products).unwrap(), 0);
}

// =============================================================================
// ROUTE GUARD
// =============================================================================

#[tokio::test]
async fn test_admin_page_redirects_then_reachable_after_sign_in() {
    let h = harness();

    let anonymous = h.server.get("/admin/payments").await;
    assert_eq!(anonymous.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(anonymous.header("location"), "/auth?next=/admin/payments");

    let signed_in = h
        .server
        .post("/api/auth/sign-in")
        .json(&json!({
            "email": ADMIN_EMAIL,
            "password": ADMIN_PASSWORD,
            "next": "/admin/payments"
        }))
        .await;
    assert_eq!(signed_in.status_code(), StatusCode::OK);
    let body: Value = signed_in.json();
    assert_eq!(body["redirect_to"], "/admin/payments");
    assert_eq!(body["user"]["role"], "admin");
    let token = body["access_token"].as_str().unwrap().to_string();

    let page = h
        .server
        .get("/admin/payments")
        .authorization_bearer(&token)
        .await;
    assert_eq!(page.status_code(), StatusCode::OK);
    assert!(page.text().contains("AdminPayments"));

    let cookie = HeaderValue::from_str(&format!("jeason_session={token}")).unwrap();
    let via_cookie = h.server.get("/admin/dashboard").add_header(COOKIE, cookie).await;
    assert_eq!(via_cookie.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_sign_in_never_redirects_off_site() {
    let h = harness();
    let body: Value = h
        .server
        .post("/api/auth/sign-in")
        .json(&json!({
            "email": ADMIN_EMAIL,
            "password": ADMIN_PASSWORD,
            "next": "https://evil.example/phish"
        }))
        .await
        .json();
    assert_eq!(body["redirect_to"], "/admin/dashboard");
}

#[tokio::test]
async fn test_customer_is_forbidden_from_admin_family() {
    let h = harness();
    let token = customer_token(&h, "buyer@example.com").await;

    let page = h.server.get("/admin/dashboard").authorization_bearer(&token).await;
    assert_eq!(page.status_code(), StatusCode::FORBIDDEN);

    let api = h.server.get("/api/admin/quotes").authorization_bearer(&token).await;
    assert_eq!(api.status_code(), StatusCode::FORBIDDEN);

    let change_password = h.server.get("/change-password").authorization_bearer(&token).await;
    assert_eq!(change_password.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_pages_and_unknown_paths() {
    let h = harness();
    assert_eq!(h.server.get("/").await.status_code(), StatusCode::OK);
    assert_eq!(h.server.get("/product/12").await.status_code(), StatusCode::OK);
    assert_eq!(
        h.server.get("/services/fabrication").await.status_code(),
        StatusCode::OK
    );
    assert_eq!(h.server.get("/admin/unknown").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_api_without_session_is_unauthorized() {
    let h = harness();
    let response = h.server.get("/api/admin/summary").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["login"], "/auth");

    let bad = h
        .server
        .get("/api/admin/summary")
        .authorization_bearer("not-a-real-token")
        .await;
    assert_eq!(bad.status_code(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// AUTH
// =============================================================================

#[tokio::test]
async fn test_refresh_rotates_and_ends_old_pair() {
    let h = harness();
    let grant: Value = h
        .server
        .post("/api/auth/sign-in")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await
        .json();
    let old_access = grant["access_token"].as_str().unwrap().to_string();
    let old_refresh = grant["refresh_token"].as_str().unwrap().to_string();

    let refreshed = h
        .server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": old_refresh }))
        .await;
    assert_eq!(refreshed.status_code(), StatusCode::OK);
    let new_access = refreshed.json::<Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let old = h.server.get("/api/auth/me").authorization_bearer(&old_access).await;
    assert_eq!(old.status_code(), StatusCode::UNAUTHORIZED);
    let new = h.server.get("/api/auth/me").authorization_bearer(&new_access).await;
    assert_eq!(new.status_code(), StatusCode::OK);
    assert_eq!(new.json::<Value>()["email"], ADMIN_EMAIL);

    let replay = h
        .server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": old_refresh }))
        .await;
    assert_eq!(replay.status_code(), StatusCode::UNAUTHORIZED);

    // Only the live pair is stored.
    assert_eq!(h.office.count(Table::Sessions).unwrap(), 2);
}

#[tokio::test]
async fn test_sign_out_ends_session() {
    let h = harness();
    let token = admin_token(&h).await;
    assert_eq!(h.office.count(Table::Sessions).unwrap(), 2);
    let out = h.server.post("/api/auth/sign-out").authorization_bearer(&token).await;
    assert_eq!(out.status_code(), StatusCode::NO_CONTENT);
    let after = h.server.get("/api/auth/me").authorization_bearer(&token).await;
    assert_eq!(after.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(h.office.count(Table::Sessions).unwrap(), 0);
}

#[tokio::test]
async fn test_password_attempts_are_rate_limited() {
    let h = harness_with(|config| ServerConfig {
        auth_attempts_per_minute: 3,
        submissions_per_minute: 1,
        ..config
    });
    for _ in 0..3 {
        let wrong = h
            .server
            .post("/api/auth/sign-in")
            .json(&json!({ "email": ADMIN_EMAIL, "password": "guess-guess" }))
            .await;
        assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
    }
    let limited = h
        .server
        .post("/api/auth/sign-in")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    let sign_up = h
        .server
        .post("/api/auth/sign-up")
        .json(&json!({ "email": "new@example.com", "password": "customer-pass" }))
        .await;
    assert_eq!(sign_up.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(h.office.count(Table::Sessions).unwrap(), 0);

    // Form submissions keep their own quota.
    let quote = h.server.post("/api/quotes").json(&quote_body()).await;
    assert_eq!(quote.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let h = harness();
    let response = h
        .server
        .post("/api/auth/sign-in")
        .json(&json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_change_password_flow() {
    let h = harness();
    let token = admin_token(&h).await;

    let mismatch = h
        .server
        .post("/api/auth/change-password")
        .authorization_bearer(&token)
        .json(&json!({
            "current_password": ADMIN_PASSWORD,
            "new_password": "girder-2025",
            "confirm_password": "girder-2026"
        }))
        .await;
    assert_eq!(mismatch.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(mismatch.json::<Value>()["error"], "Passwords do not match");

    let changed = h
        .server
        .post("/api/auth/change-password")
        .authorization_bearer(&token)
        .json(&json!({
            "current_password": ADMIN_PASSWORD,
            "new_password": "girder-2025",
            "confirm_password": "girder-2025"
        }))
        .await;
    assert_eq!(changed.status_code(), StatusCode::OK);

    sign_in(&h, ADMIN_EMAIL, "girder-2025").await;
    let old = h
        .server
        .post("/api/auth/sign-in")
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await;
    assert_eq!(old.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password_requires_session() {
    let h = harness();
    let response = h
        .server
        .post("/api/auth/change-password")
        .json(&json!({
            "current_password": "x",
            "new_password": "abcdef",
            "confirm_password": "abcdef"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// PAYMENT INITIALIZATION
// =============================================================================

#[tokio::test]
async fn test_initialize_returns_link_and_one_pending_transaction() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .and(header("authorization", "Bearer FLWSECK_TEST-secret"))
        .and(body_partial_json(json!({
            "amount": "2500.50",
            "currency": "NGN",
            "redirect_url": "https://shop.jeason.test/payment/callback",
            "customer": { "email": "ada@example.com", "name": "Ada Eze" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(checkout_ok()))
        .expect(1)
        .mount(&provider)
        .await;

    let uri = provider.uri();
    let h = harness_with(|config| ServerConfig {
        flutterwave_url: uri,
        ..config
    });

    let response = h
        .server
        .post("/api/payments/initialize")
        .add_header(ORIGIN, HeaderValue::from_static("https://shop.jeason.test"))
        .json(&json!({
            "amount": 250_050,
            "customer": { "name": "Ada Eze", "email": "ada@example.com", "phone": "0809" }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["payment_link"], "https://checkout.flutterwave.test/pay/abc123");

    let transactions = h.office.list_transactions(None).unwrap();
    assert_eq!(transactions.len(), 1);
    let tx = &transactions[0];
    assert_eq!(body["transaction_id"], tx.id.as_str());
    assert_eq!(tx.payment_status, PaymentStatus::Pending);
    assert_eq!(tx.amount, Money(250_050));
    assert_eq!(tx.currency, "NGN");
    assert_eq!(tx.user_id, None);
    let reference = tx.provider_reference.clone().unwrap();
    assert!(reference.starts_with("TX-"), "{reference}");
    assert_eq!(reference.split('-').count(), 3);
}

#[tokio::test]
async fn test_initialize_zero_or_missing_amount_writes_nothing() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(checkout_ok()))
        .expect(0)
        .mount(&provider)
        .await;
    let uri = provider.uri();
    let h = harness_with(|config| ServerConfig {
        flutterwave_url: uri,
        ..config
    });

    for body in [json!({ "amount": 0 }), json!({}), json!({ "customer": { "email": "a@b.co" } })] {
        let response = h.server.post("/api/payments/initialize").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Amount is required");
    }
    assert_eq!(h.office.count(Table::Transactions).unwrap(), 0);
}

#[tokio::test]
async fn test_provider_failure_is_502_and_marks_transaction_failed() {
    let provider = provider_mock(500, json!({ "status": "error", "message": "down" })).await;
    let uri = provider.uri();
    let h = harness_with(|config| ServerConfig {
        flutterwave_url: uri,
        ..config
    });

    let response = h
        .server
        .post("/api/payments/initialize")
        .json(&json!({ "amount": 10_000 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let error = response.json::<Value>()["error"].as_str().unwrap().to_string();
    assert!(!error.contains("down"), "provider detail leaked: {error}");

    let transactions = h.office.list_transactions(None).unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].payment_status, PaymentStatus::Failed);
}

#[tokio::test]
async fn test_malformed_provider_response_is_502() {
    let provider = provider_mock(200, json!({ "status": "success", "data": {} })).await;
    let uri = provider.uri();
    let h = harness_with(|config| ServerConfig {
        flutterwave_url: uri,
        ..config
    });
    let response = h
        .server
        .post("/api/payments/initialize")
        .json(&json!({ "amount": 10_000 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let failed = h.office.list_transactions(Some(PaymentStatus::Failed)).unwrap();
    assert_eq!(failed.len(), 1);
}

#[tokio::test]
async fn test_invalid_token_proceeds_as_guest() {
    let provider = provider_mock(200, checkout_ok()).await;
    let uri = provider.uri();
    let h = harness_with(|config| ServerConfig {
        flutterwave_url: uri,
        ..config
    });
    let response = h
        .server
        .post("/api/payments/initialize")
        .authorization_bearer("expired-or-forged")
        .json(&json!({ "amount": 5_000 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let transactions = h.office.list_transactions(None).unwrap();
    assert_eq!(transactions[0].user_id, None);
}

#[tokio::test]
async fn test_signed_in_payer_email_is_the_fallback() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .and(body_partial_json(json!({
            "customer": { "email": "payer@example.com" },
            "redirect_url": "http://jeason.test/payment/callback"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(checkout_ok()))
        .expect(1)
        .mount(&provider)
        .await;
    let uri = provider.uri();
    let h = harness_with(|config| ServerConfig {
        flutterwave_url: uri,
        ..config
    });
    let token = customer_token(&h, "payer@example.com").await;

    let response = h
        .server
        .post("/api/payments/initialize")
        .authorization_bearer(&token)
        .json(&json!({ "amount": 7_500 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let tx = &h.office.list_transactions(None).unwrap()[0];
    assert!(tx.user_id.is_some());
}

#[tokio::test]
async fn test_unconfigured_provider_fails_cleanly() {
    let h = harness_with(|config| ServerConfig {
        flutterwave_secret: None,
        ..config
    });
    let response = h
        .server
        .post("/api/payments/initialize")
        .json(&json!({ "amount": 5_000 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        h.office.list_transactions(Some(PaymentStatus::Failed)).unwrap().len(),
        1
    );
}

// =============================================================================
// BANK TRANSFER, PROOF AND VERIFICATION
// =============================================================================

async fn open_transfer(h: &Harness, token: &str) -> String {
    let response = h
        .server
        .post("/api/payments/bank-transfer")
        .authorization_bearer(token)
        .json(&json!({ "amount": 1_000_000, "reference": "FT24123ABC" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["payment_method"], "bank_transfer");
    assert_eq!(body["payment_status"], "pending");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_bank_transfer_requires_reference() {
    let h = harness();
    let response = h
        .server
        .post("/api/payments/bank-transfer")
        .json(&json!({ "amount": 1_000 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["fields"]["reference"],
        "Transfer reference is required"
    );
}

#[tokio::test]
async fn test_proof_upload_owner_only_and_admin_can_read_it() {
    let h = harness();
    let owner = customer_token(&h, "owner@example.com").await;
    let stranger = customer_token(&h, "stranger@example.com").await;
    let id = open_transfer(&h, &owner).await;

    let bad_ext = h
        .server
        .put(&format!("/api/payments/{id}/proof"))
        .authorization_bearer(&owner)
        .add_query_param("ext", "exe")
        .bytes(Bytes::from_static(b"MZ"))
        .await;
    assert_eq!(bad_ext.status_code(), StatusCode::BAD_REQUEST);

    let not_owner = h
        .server
        .put(&format!("/api/payments/{id}/proof"))
        .authorization_bearer(&stranger)
        .add_query_param("ext", "png")
        .bytes(Bytes::from_static(b"\x89PNG"))
        .await;
    assert_eq!(not_owner.status_code(), StatusCode::FORBIDDEN);

    let uploaded = h
        .server
        .put(&format!("/api/payments/{id}/proof"))
        .authorization_bearer(&owner)
        .add_query_param("ext", "png")
        .bytes(Bytes::from_static(b"\x89PNG"))
        .await;
    assert_eq!(uploaded.status_code(), StatusCode::OK);
    let tx: Value = uploaded.json();
    assert_eq!(tx["payment_status"], "processing");
    let proof_path = tx["payment_proof_path"].as_str().unwrap().to_string();
    assert!(proof_path.starts_with(&format!("{}/{id}/", tx["user_id"])));
    assert!(proof_path.ends_with(".png"));

    let admin = admin_token(&h).await;
    let file = h
        .server
        .get(&format!("/api/admin/files/payment_proofs/{proof_path}"))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(file.status_code(), StatusCode::OK);
    assert_eq!(file.as_bytes().as_ref(), b"\x89PNG");

    let anonymous = h
        .server
        .get(&format!("/api/admin/files/payment_proofs/{proof_path}"))
        .await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let mine: Vec<Value> = h
        .server
        .get("/api/payments/mine")
        .authorization_bearer(&owner)
        .await
        .json();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn test_reviewed_proof_cannot_be_replaced() {
    let h = harness();
    let owner = customer_token(&h, "owner@example.com").await;
    let id = open_transfer(&h, &owner).await;

    let original = h
        .server
        .put(&format!("/api/payments/{id}/proof"))
        .authorization_bearer(&owner)
        .add_query_param("ext", "png")
        .bytes(Bytes::from_static(b"ORIGINAL"))
        .await;
    assert_eq!(original.status_code(), StatusCode::OK);
    let proof_path = original.json::<Value>()["payment_proof_path"]
        .as_str()
        .unwrap()
        .to_string();

    let admin = admin_token(&h).await;
    let verified = h
        .server
        .post(&format!("/api/admin/transactions/{id}/verify"))
        .authorization_bearer(&admin)
        .json(&json!({ "approved": true }))
        .await;
    assert_eq!(verified.status_code(), StatusCode::OK);

    let tampered = h
        .server
        .put(&format!("/api/payments/{id}/proof"))
        .authorization_bearer(&owner)
        .add_query_param("ext", "png")
        .bytes(Bytes::from_static(b"TAMPERED"))
        .await;
    assert_eq!(tampered.status_code(), StatusCode::CONFLICT);

    let tx = h.office.transaction(&id).unwrap();
    assert_eq!(tx.payment_proof_path.as_deref(), Some(proof_path.as_str()));
    let file = h
        .server
        .get(&format!("/api/admin/files/payment_proofs/{proof_path}"))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(file.status_code(), StatusCode::OK);
    assert_eq!(file.as_bytes().as_ref(), b"ORIGINAL");
}

#[tokio::test]
async fn test_second_proof_gets_its_own_file() {
    let h = harness();
    let owner = customer_token(&h, "owner@example.com").await;
    let id = open_transfer(&h, &owner).await;

    let mut paths = Vec::new();
    for bytes in [b"FIRST".as_slice(), b"SECOND".as_slice()] {
        let uploaded = h
            .server
            .put(&format!("/api/payments/{id}/proof"))
            .authorization_bearer(&owner)
            .add_query_param("ext", "png")
            .bytes(Bytes::copy_from_slice(bytes))
            .await;
        assert_eq!(uploaded.status_code(), StatusCode::OK);
        paths.push(
            uploaded.json::<Value>()["payment_proof_path"]
                .as_str()
                .unwrap()
                .to_string(),
        );
    }
    assert_ne!(paths[0], paths[1]);

    let admin = admin_token(&h).await;
    let first = h
        .server
        .get(&format!("/api/admin/files/payment_proofs/{}", paths[0]))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(first.as_bytes().as_ref(), b"FIRST");
}

#[tokio::test]
async fn test_verification_sets_audit_fields_once() {
    let h = harness();
    let customer = customer_token(&h, "buyer@example.com").await;
    let id = open_transfer(&h, &customer).await;
    let admin = admin_token(&h).await;

    let verified = h
        .server
        .post(&format!("/api/admin/transactions/{id}/verify"))
        .authorization_bearer(&admin)
        .json(&json!({ "approved": true }))
        .await;
    assert_eq!(verified.status_code(), StatusCode::OK);
    let tx: Value = verified.json();
    assert_eq!(tx["payment_status"], "completed");
    assert_eq!(tx["admin_verified"], true);
    assert_eq!(tx["admin_verified_by"], 1);
    assert!(tx["admin_verified_at"].as_u64().is_some());

    let again = h
        .server
        .post(&format!("/api/admin/transactions/{id}/verify"))
        .authorization_bearer(&admin)
        .json(&json!({ "approved": false }))
        .await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);

    let completed: Vec<Value> = h
        .server
        .get("/api/admin/transactions")
        .authorization_bearer(&admin)
        .add_query_param("status", "completed")
        .await
        .json();
    assert_eq!(completed.len(), 1);

    let bad_filter = h
        .server
        .get("/api/admin/transactions")
        .authorization_bearer(&admin)
        .add_query_param("status", "settled")
        .await;
    assert_eq!(bad_filter.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_explicit_notification_goes_to_account_email() {
    let email_api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test_key"))
        .and(body_partial_json(json!({
            "to": ["buyer@example.com"],
            "subject": "Payment completed - Jeason Steel"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "email_1" })))
        .expect(1..)
        .mount(&email_api)
        .await;
    let uri = email_api.uri();
    let h = harness_with(|config| ServerConfig {
        email_api_url: uri,
        email_api_key: Some("re_test_key".to_string()),
        ..config
    });
    let customer = customer_token(&h, "buyer@example.com").await;
    let id = open_transfer(&h, &customer).await;
    h.office.verify_transaction(&id, true, 1, Timestamp(50)).unwrap();

    let admin = admin_token(&h).await;
    let response = h
        .server
        .post(&format!("/api/admin/transactions/{id}/notify"))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["delivery"], "sent");
    assert_eq!(body["sent"], true);
}

#[tokio::test]
async fn test_email_failure_is_reported_as_email_failure() {
    let email_api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(500).set_body_string("mail relay down"))
        .mount(&email_api)
        .await;
    let uri = email_api.uri();
    let h = harness_with(|config| ServerConfig {
        email_api_url: uri,
        email_api_key: Some("re_test_key".to_string()),
        ..config
    });
    let customer = customer_token(&h, "buyer@example.com").await;
    let id = open_transfer(&h, &customer).await;
    let admin = admin_token(&h).await;

    let response = h
        .server
        .post(&format!("/api/admin/transactions/{id}/notify"))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let message = response.json::<Value>()["error"].as_str().unwrap().to_string();
    assert!(message.contains("notification email"), "{message}");
    assert!(!message.contains("payment provider"), "{message}");
}

#[tokio::test]
async fn test_notification_is_skipped_without_key() {
    let h = harness();
    let customer = customer_token(&h, "buyer@example.com").await;
    let id = open_transfer(&h, &customer).await;
    let admin = admin_token(&h).await;
    let body: Value = h
        .server
        .post(&format!("/api/admin/transactions/{id}/notify"))
        .authorization_bearer(&admin)
        .await
        .json();
    assert_eq!(body["delivery"], "skipped_no_key");
    assert_eq!(body["sent"], false);
}

#[tokio::test]
async fn test_bank_accounts_public_listing_hides_inactive() {
    let h = harness();
    let admin = admin_token(&h).await;
    for number in ["0123456789", "9876543210"] {
        let created = h
            .server
            .post("/api/admin/bank-accounts")
            .authorization_bearer(&admin)
            .json(&json!({
                "bank_name": "Zenith Bank",
                "account_name": "Jeason Steel Ltd",
                "account_number": number
            }))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);
    }
    let deactivated = h
        .server
        .patch("/api/admin/bank-accounts/2")
        .authorization_bearer(&admin)
        .json(&json!({ "is_active": false }))
        .await;
    assert_eq!(deactivated.status_code(), StatusCode::OK);

    let public: Vec<Value> = h.server.get("/api/bank-accounts").await.json();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0]["account_number"], "0123456789");
}

// =============================================================================
// ADMIN WORKFLOWS
// =============================================================================

#[tokio::test]
async fn test_quote_and_application_status_only_from_pending() {
    let h = harness();
    let admin = admin_token(&h).await;
    h.server.post("/api/quotes").json(&quote_body()).await;

    let closed = h
        .server
        .patch("/api/admin/quotes/1")
        .authorization_bearer(&admin)
        .json(&json!({ "status": "completed" }))
        .await;
    assert_eq!(closed.status_code(), StatusCode::OK);
    let reopened = h
        .server
        .patch("/api/admin/quotes/1")
        .authorization_bearer(&admin)
        .json(&json!({ "status": "rejected" }))
        .await;
    assert_eq!(reopened.status_code(), StatusCode::CONFLICT);

    let career = h
        .office
        .create_career(
            CareerDraft {
                title: "Crane Operator".to_string(),
                department: "Yard".to_string(),
                location: "Kano".to_string(),
                employment_type: "Full-time".to_string(),
                description: "Operate overhead cranes in the coil yard".to_string(),
            },
            Timestamp(1),
        )
        .unwrap();
    h.office
        .apply_for_career(
            career.id,
            jeason_core::ApplicationDraft {
                name: "Musa".to_string(),
                email: "musa@example.com".to_string(),
                phone: "0805".to_string(),
                experience: "6 years".to_string(),
                resume_url: None,
            },
            Timestamp(2),
        )
        .unwrap();

    let approved = h
        .server
        .patch("/api/admin/applications/1")
        .authorization_bearer(&admin)
        .json(&json!({ "status": "approved" }))
        .await;
    assert_eq!(approved.status_code(), StatusCode::OK);
    assert_eq!(
        h.office.application(1).unwrap().status,
        ApplicationStatus::Approved
    );
    let again = h
        .server
        .patch("/api/admin/applications/1")
        .authorization_bearer(&admin)
        .json(&json!({ "status": "rejected" }))
        .await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_dashboard_summary() {
    let h = harness();
    let admin = admin_token(&h).await;
    h.office.create_product(product_draft("Plate 10mm"), Timestamp(1)).unwrap();
    h.server.post("/api/quotes").json(&quote_body()).await;

    let summary: Value = h
        .server
        .get("/api/admin/summary")
        .authorization_bearer(&admin)
        .await
        .json();
    assert_eq!(summary["products"], 1);
    assert_eq!(summary["pending_quotes"], 1);
    assert_eq!(summary["careers"], 0);
}

#[tokio::test]
async fn test_upload_over_the_size_cap_is_rejected() {
    let h = harness_with(|config| ServerConfig {
        max_upload_bytes: 256,
        ..config
    });
    let admin = admin_token(&h).await;

    let too_big = h
        .server
        .post("/api/admin/uploads/products")
        .authorization_bearer(&admin)
        .add_query_param("ext", "png")
        .bytes(Bytes::from(vec![7u8; 512]))
        .await;
    assert_eq!(too_big.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

    let fits = h
        .server
        .post("/api/admin/uploads/products")
        .authorization_bearer(&admin)
        .add_query_param("ext", "png")
        .bytes(Bytes::from_static(b"\x89PNG"))
        .await;
    assert_eq!(fits.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_product_image_upload_is_publicly_served() {
    let h = harness();
    let admin = admin_token(&h).await;

    let rejected = h
        .server
        .post("/api/admin/uploads/products")
        .authorization_bearer(&admin)
        .add_query_param("ext", "svg")
        .bytes(Bytes::from_static(b"<svg/>"))
        .await;
    assert_eq!(rejected.status_code(), StatusCode::BAD_REQUEST);

    let uploaded = h
        .server
        .post("/api/admin/uploads/products")
        .authorization_bearer(&admin)
        .add_query_param("ext", "JPG")
        .bytes(Bytes::from_static(b"\xff\xd8\xff"))
        .await;
    assert_eq!(uploaded.status_code(), StatusCode::CREATED);
    let body: Value = uploaded.json();
    let object = body["path"].as_str().unwrap().to_string();
    assert!(object.ends_with(".jpg"));
    assert_eq!(
        body["url"],
        format!("http://jeason.test/files/products/{object}")
    );

    let served = h.server.get(&format!("/files/products/{object}")).await;
    assert_eq!(served.status_code(), StatusCode::OK);
    assert_eq!(served.header("content-type"), "image/jpeg");

    let missing = h.server.get("/files/products/nope.jpg").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}
