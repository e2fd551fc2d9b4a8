use crate::storage::{Record, Table, numeric_key};
use crate::validation::{self, FieldErrors};
use crate::CoreError;
use serde::{Deserialize, Serialize};

/// A company account customers can pay into by bank transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: u64,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub is_active: bool,
}

impl Record for BankAccount {
    const TABLE: Table = Table::BankAccounts;

    fn key(&self) -> String {
        numeric_key(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankAccountDraft {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub is_active: bool,
}

impl Default for BankAccountDraft {
    fn default() -> Self {
        Self {
            bank_name: String::new(),
            account_name: String::new(),
            account_number: String::new(),
            is_active: true,
        }
    }
}

impl BankAccountDraft {
    /// Names are required; the account number must be exactly ten digits (NUBAN).
    pub fn normalize(self) -> Result<BankAccountDraft, CoreError> {
        let mut errors = FieldErrors::new();
        validation::required(&mut errors, "bank_name", &self.bank_name, "Bank name");
        validation::required(&mut errors, "account_name", &self.account_name, "Account name");
        let number = self.account_number.trim();
        if number.len() != 10 || !number.chars().all(|c| c.is_ascii_digit()) {
            errors.add("account_number", "Account number must be 10 digits");
        }
        errors.into_result()?;

        Ok(BankAccountDraft {
            bank_name: self.bank_name.trim().to_string(),
            account_name: self.account_name.trim().to_string(),
            account_number: number.to_string(),
            is_active: self.is_active,
        })
    }
}
