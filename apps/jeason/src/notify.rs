//! # Payment Notifications
//!
//! Transactional email through a Resend-compatible API (`POST {base}/emails`).
//!
//! Notifications are best effort. With no API key the send is skipped and
//! reported as such; callers log failures and move on.

use jeason_core::{PaymentStatus, Transaction};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email API rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// What happened to one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Sent,
    /// No API key configured.
    SkippedNoKey,
    /// Nobody to send to.
    SkippedNoRecipient,
}

#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
}

/// Subject line for a status email, e.g. `Payment completed - Jeason Steel`.
#[must_use]
pub fn subject_for(status: PaymentStatus) -> String {
    format!("Payment {} - Jeason Steel", status.as_str())
}

/// Escape text for an HTML body. Every customer-supplied value goes
/// through here.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn body_for(transaction: &Transaction) -> String {
    let reference = transaction
        .provider_reference
        .as_deref()
        .or(transaction.bank_transfer_reference.as_deref())
        .unwrap_or(&transaction.id);
    let headline = match transaction.payment_status {
        PaymentStatus::Completed => "Your payment has been confirmed.",
        PaymentStatus::Failed => "We could not confirm your payment.",
        PaymentStatus::Processing => "Your payment is being reviewed.",
        PaymentStatus::Refunded => "Your payment has been refunded.",
        PaymentStatus::Pending => "Your payment is awaiting confirmation.",
    };
    format!(
        "<h2>{headline}</h2>\
         <p>Amount: {} {}</p>\
         <p>Reference: {}</p>\
         <p>Status: {}</p>\
         <p>Thank you for choosing Jeason Steel.</p>",
        escape_html(&transaction.currency),
        escape_html(&transaction.amount.major_units()),
        escape_html(reference),
        escape_html(transaction.payment_status.as_str()),
    )
}

/// Email API client.
#[derive(Debug, Clone)]
pub struct Notifier {
    base_url: String,
    api_key: Option<String>,
    from: String,
    client: reqwest::Client,
}

impl Notifier {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        from: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            from: from.into(),
            client,
        })
    }

    /// Tell the customer where their payment stands.
    ///
    /// `recipient` is the customer email, or the payer's account email when
    /// the checkout form had none.
    pub async fn payment_status(
        &self,
        transaction: &Transaction,
        recipient: Option<&str>,
    ) -> Result<Delivery, NotifyError> {
        let Some(api_key) = self.api_key.as_deref() else {
            info!(transaction = %transaction.id, "email API key not set, skipping notification");
            return Ok(Delivery::SkippedNoKey);
        };
        let Some(to) = recipient.map(str::trim).filter(|r| !r.is_empty()) else {
            info!(transaction = %transaction.id, "no recipient for payment notification");
            return Ok(Delivery::SkippedNoRecipient);
        };

        let payload = EmailPayload {
            from: &self.from,
            to: [to],
            subject: subject_for(transaction.payment_status),
            html: body_for(transaction),
        };
        let resp = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        info!(transaction = %transaction.id, to, "payment notification sent");
        Ok(Delivery::Sent)
    }
}
