//! # Quotes
//!
//! Quote requests from the storefront form and their admin workflow.

use crate::storage::{Table, numeric_key};
use crate::{Backoffice, CoreError, QuoteDraft, QuoteRequest, QuoteStatus, Timestamp};

impl Backoffice {
    /// Store a new request with status `pending`.
    pub fn submit_quote(
        &self,
        draft: QuoteDraft,
        now: Timestamp,
    ) -> Result<QuoteRequest, CoreError> {
        let draft = draft.normalize()?;
        let quote = QuoteRequest {
            id: self.next_id(Table::QuoteRequests)?,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            company: draft.company,
            product_details: draft.product_details,
            quantity: draft.quantity,
            status: QuoteStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.save(&quote)?;
        Ok(quote)
    }

    /// Every request, newest first.
    pub fn list_quotes(&self) -> Result<Vec<QuoteRequest>, CoreError> {
        let mut quotes: Vec<QuoteRequest> = self.load_all()?;
        quotes.reverse();
        Ok(quotes)
    }

    pub fn quote(&self, id: u64) -> Result<QuoteRequest, CoreError> {
        self.load(&numeric_key(id))?
            .ok_or_else(|| CoreError::not_found(format!("quote request {id}")))
    }

    /// Close a pending request as completed or rejected.
    pub fn set_quote_status(
        &self,
        id: u64,
        status: QuoteStatus,
        now: Timestamp,
    ) -> Result<QuoteRequest, CoreError> {
        if status == QuoteStatus::Pending {
            return Err(CoreError::field("status", "Status must be completed or rejected"));
        }
        self.modify(&numeric_key(id), |quote: &mut QuoteRequest| {
            if quote.status != QuoteStatus::Pending {
                return Err(CoreError::Conflict(format!(
                    "quote request {id} is already {}",
                    quote.status.as_str()
                )));
            }
            quote.status = status;
            quote.updated_at = now;
            Ok(())
        })?
        .ok_or_else(|| CoreError::not_found(format!("quote request {id}")))
    }

    pub fn delete_quote(&self, id: u64) -> Result<(), CoreError> {
        if self.remove::<QuoteRequest>(&numeric_key(id))? {
            Ok(())
        } else {
            Err(CoreError::not_found(format!("quote request {id}")))
        }
    }
}
