use crate::storage::{Record, Table};
use crate::{Money, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Hosted checkout with the card/transfer provider.
    Flutterwave,
    /// Direct transfer to one of the company bank accounts.
    BankTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    /// Proof of payment uploaded, waiting for an admin.
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Parse the wire name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "processing" => Some(PaymentStatus::Processing),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// Contact details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// A payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// UUIDv4 assigned by the server.
    pub id: String,
    /// Account that started the payment, if signed in.
    pub user_id: Option<u64>,
    pub amount: Money,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// `TX-<millis>-<n>` reference sent to the payment provider.
    pub provider_reference: Option<String>,
    pub bank_transfer_reference: Option<String>,
    /// Storage path of the uploaded proof, inside the `payment_proofs` bucket.
    pub payment_proof_path: Option<String>,
    pub admin_verified: bool,
    pub admin_verified_at: Option<Timestamp>,
    pub admin_verified_by: Option<u64>,
    pub customer: Option<CustomerDetails>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Transaction {
    /// Where a notification about this transaction should go, if anywhere.
    #[must_use]
    pub fn customer_email(&self) -> Option<&str> {
        self.customer
            .as_ref()
            .map(|c| c.email.trim())
            .filter(|email| !email.is_empty())
    }
}

impl Record for Transaction {
    const TABLE: Table = Table::Transactions;

    fn key(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_round_trips_wire_names() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Processing,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::parse("settled"), None);
    }

    #[test]
    fn method_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap_or_default(),
            "\"bank_transfer\""
        );
    }
}
