//! # Jeason Core
//!
//! Records, validation and back-office services for the Jeason Steel site.
//!
//! The core owns everything the storefront and the admin back-office need to
//! agree on: the product catalog, career openings and applications, quote
//! requests, payment transactions and bank accounts, admin accounts and their
//! sessions, and the page guard for the admin route family.
//!
//! ## Determinism
//!
//! Nothing in this crate reads the wall clock, touches the network or draws
//! random numbers. Timestamps, transaction ids, password salts and session
//! tokens are handed in by the caller (`apps/jeason`), which keeps every
//! service method reproducible under test.
//!
//! ## Layout
//!
//! - [`storage`]: the [`storage::RecordStore`] trait with redb and in-memory backends
//! - [`backoffice`]: the [`Backoffice`] service handle; each domain module
//!   (`catalog`, `careers`, `quotes`, `payments`, `auth`, `cart`) adds its
//!   operations to it
//! - [`validation`]: field-level form validation
//! - [`routes`]: the fixed page table and the login redirect guard

pub mod auth;
pub mod backoffice;
pub mod careers;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod formats;
pub mod model;
pub mod payments;
pub mod quotes;
pub mod routes;
pub mod storage;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use backoffice::{Backoffice, Summary};
pub use error::CoreError;
pub use model::*;
pub use validation::FieldErrors;

// =============================================================================
// PRIMITIVES
// =============================================================================

/// Seconds since the unix epoch.
///
/// Supplied by the caller; the core never reads the clock itself.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The timestamp `secs` seconds later, saturating at `u64::MAX`.
    #[must_use]
    pub fn plus_secs(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

/// An amount of money in minor units (kobo for NGN).
///
/// Prices and payment amounts are never floats. The only place a decimal
/// appears is [`Money::major_units`], which renders the amount for the
/// payment provider.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub u64);

impl Money {
    /// Zero kobo.
    pub const ZERO: Money = Money(0);

    /// Build from whole naira.
    #[must_use]
    pub fn from_major(units: u64) -> Self {
        Self(units.saturating_mul(100))
    }

    /// The raw minor-unit value.
    #[must_use]
    pub fn minor(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self * quantity`, saturating.
    #[must_use]
    pub fn times(self, quantity: u64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }

    /// `self + other`, saturating.
    #[must_use]
    pub fn plus(self, other: Money) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Render as a decimal string in major units, e.g. `1500.05`.
    #[must_use]
    pub fn major_units(self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Default currency for every transaction.
pub const DEFAULT_CURRENCY: &str = "NGN";

// =============================================================================
// TESTS
// =============================================================================
