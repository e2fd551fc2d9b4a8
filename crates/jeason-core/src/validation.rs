//! # Validation Module
//!
//! Field-level form validation.
//!
//! Every submission (quote, application, product, career, payment) is checked
//! in full before anything is written. All failing fields are reported at
//! once so a form can show each message next to its input.

use crate::{CoreError, Money};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Failing fields, keyed by field name, in deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing failed, otherwise [`CoreError::Validation`].
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

// =============================================================================
// RULES
// =============================================================================

/// Field must be present and not blank.
pub fn required(errors: &mut FieldErrors, field: &str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{label} is required"));
    }
}

/// Field must have at least `min` characters once trimmed.
pub fn min_len(errors: &mut FieldErrors, field: &str, value: &str, min: usize, label: &str) {
    if value.trim().chars().count() < min {
        errors.add(field, format!("{label} must be at least {min} characters"));
    }
}

/// Field must be a plausible email address. Blank values report "required".
pub fn email(errors: &mut FieldErrors, field: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "Email is required");
    } else if !is_email(value) {
        errors.add(field, "Email must be a valid email address");
    }
}

/// Amount must be strictly positive.
pub fn positive(errors: &mut FieldErrors, field: &str, value: Money, label: &str) {
    if value.is_zero() {
        errors.add(field, format!("{label} must be positive"));
    }
}

/// Shape check only: one `@`, a non-empty local part, a dotted domain, no
/// whitespace.
#[must_use]
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

// =============================================================================
// TESTS
// =============================================================================
