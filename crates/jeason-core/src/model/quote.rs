use crate::storage::{Record, Table, numeric_key};
use crate::validation::{self, FieldErrors};
use crate::{CoreError, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Pending,
    Completed,
    Rejected,
}

impl QuoteStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Completed => "completed",
            QuoteStatus::Rejected => "rejected",
        }
    }
}

/// A request for a price quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub product_details: String,
    pub quantity: String,
    pub status: QuoteStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Record for QuoteRequest {
    const TABLE: Table = Table::QuoteRequests;

    fn key(&self) -> String {
        numeric_key(self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub product_details: String,
    pub quantity: String,
}

impl QuoteDraft {
    /// Every field is required and the email must be well formed.
    pub fn normalize(self) -> Result<QuoteDraft, CoreError> {
        let mut errors = FieldErrors::new();
        validation::required(&mut errors, "name", &self.name, "Name");
        validation::email(&mut errors, "email", &self.email);
        validation::required(&mut errors, "phone", &self.phone, "Phone");
        validation::required(&mut errors, "company", &self.company, "Company");
        validation::required(
            &mut errors,
            "product_details",
            &self.product_details,
            "Product details",
        );
        validation::required(&mut errors, "quantity", &self.quantity, "Quantity");
        errors.into_result()?;

        Ok(QuoteDraft {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            company: self.company.trim().to_string(),
            product_details: self.product_details.trim().to_string(),
            quantity: self.quantity.trim().to_string(),
        })
    }
}
