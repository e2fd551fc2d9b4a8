//! # Model Module
//!
//! Persisted records and the drafts the forms submit.
//!
//! Stored structs are encoded with postcard, so they stay plain: no
//! `skip_serializing_if`, no flattening, no untagged enums. Drafts are only
//! ever read from JSON and default every field, so a missing field surfaces
//! as a field-level validation message instead of a decode error.

mod account;
mod bank_account;
mod career;
mod product;
mod quote;
mod transaction;

pub use account::{Account, Role, Session, SessionKind};
pub use bank_account::{BankAccount, BankAccountDraft};
pub use career::{ApplicationDraft, ApplicationStatus, Career, CareerApplication, CareerDraft};
pub use product::{Product, ProductDraft};
pub use quote::{QuoteDraft, QuoteRequest, QuoteStatus};
pub use transaction::{CustomerDetails, PaymentMethod, PaymentStatus, Transaction};
