//! # Payment Gateway
//!
//! Client for the Flutterwave-compatible hosted checkout API.
//!
//! One call matters: `POST {base}/v3/payments` with the secret key as a
//! bearer token. A successful answer carries `data.link`, the page the
//! customer is redirected to.

use jeason_core::{CustomerDetails, Money};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Error)]
pub enum GatewayError {
    /// No secret key configured.
    #[error("payment provider is not configured")]
    NotConfigured,

    /// Connection failure, timeout or unreadable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("provider rejected checkout ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// 2xx, but no usable link in the body.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// What we ask the provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub tx_ref: String,
    pub amount: Money,
    pub currency: String,
    pub redirect_url: String,
    pub transaction_id: String,
    pub customer: CustomerDetails,
}

#[derive(Debug, Serialize)]
struct CheckoutPayload<'a> {
    tx_ref: &'a str,
    /// Major units as a decimal string, e.g. `"1500.05"`.
    amount: String,
    currency: &'a str,
    redirect_url: &'a str,
    meta: CheckoutMeta<'a>,
    customer: CheckoutCustomer<'a>,
    customizations: Customizations,
}

#[derive(Debug, Serialize)]
struct CheckoutMeta<'a> {
    transaction_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CheckoutCustomer<'a> {
    email: &'a str,
    name: &'a str,
    phonenumber: &'a str,
}

#[derive(Debug, Serialize)]
struct Customizations {
    title: &'static str,
}

#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    #[serde(default)]
    status: String,
    data: Option<CheckoutData>,
}

#[derive(Debug, Deserialize)]
struct CheckoutData {
    link: Option<String>,
}

// =============================================================================
// CLIENT
// =============================================================================

/// Hosted-checkout client.
#[derive(Debug, Clone)]
pub struct PaymentGateway {
    base_url: String,
    secret_key: Option<String>,
    client: reqwest::Client,
}

impl PaymentGateway {
    /// Create a client against `base_url` with a 30-second timeout.
    pub fn new(
        base_url: impl Into<String>,
        secret_key: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key,
            client,
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Open a hosted checkout and return the payment link.
    pub async fn create_payment(&self, request: &CheckoutRequest) -> Result<String, GatewayError> {
        let secret = self.secret_key.as_deref().ok_or(GatewayError::NotConfigured)?;
        let payload = CheckoutPayload {
            tx_ref: &request.tx_ref,
            amount: request.amount.major_units(),
            currency: &request.currency,
            redirect_url: &request.redirect_url,
            meta: CheckoutMeta {
                transaction_id: &request.transaction_id,
            },
            customer: CheckoutCustomer {
                email: &request.customer.email,
                name: &request.customer.name,
                phonenumber: &request.customer.phone,
            },
            customizations: Customizations {
                title: "Jeason Steel",
            },
        };

        let url = format!("{}/v3/payments", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(secret)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CheckoutResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        match parsed.data.and_then(|d| d.link) {
            Some(link) if !link.is_empty() => Ok(link),
            _ => Err(GatewayError::Malformed(format!(
                "no payment link (status {:?})",
                parsed.status
            ))),
        }
    }
}
