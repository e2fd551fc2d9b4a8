//! # Payments
//!
//! Transaction records for hosted-checkout and bank-transfer payments, the
//! manual admin verification step, and the company bank accounts.
//!
//! The provider call itself happens in the app. This module only decides
//! what is written and when:
//!
//! 1. [`Backoffice::open_provider_payment`] checks the amount and writes one
//!    `pending` record before the provider is contacted
//! 2. [`Backoffice::mark_transaction_failed`] records a provider failure
//! 3. [`Backoffice::verify_transaction`] is the only path to `completed`

use crate::storage::{Table, numeric_key};
use crate::validation::{self, FieldErrors};
use crate::{
    Backoffice, BankAccount, BankAccountDraft, CoreError, CustomerDetails, DEFAULT_CURRENCY,
    Money, PaymentMethod, PaymentStatus, Timestamp, Transaction,
};

/// Provider reference: `TX-<unix millis>-<n>` with `n` in `0..1000`.
#[must_use]
pub fn transaction_reference(unix_millis: u64, suffix: u32) -> String {
    format!("TX-{unix_millis}-{}", suffix % 1000)
}

/// Reject a missing or zero amount.
///
/// Called before anything else happens for a payment, so a bad amount
/// leaves no trace.
pub fn require_amount(amount: Option<Money>) -> Result<Money, CoreError> {
    match amount {
        Some(amount) if !amount.is_zero() => Ok(amount),
        _ => Err(CoreError::field("amount", "Amount is required")),
    }
}

/// Everything needed to open a transaction record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Server-generated transaction id.
    pub id: String,
    pub amount: Option<Money>,
    pub customer: Option<CustomerDetails>,
    /// Signed-in account, if any.
    pub user_id: Option<u64>,
}

fn clean_customer(customer: Option<CustomerDetails>) -> Option<CustomerDetails> {
    customer
        .map(|c| CustomerDetails {
            name: c.name.trim().to_string(),
            email: c.email.trim().to_string(),
            phone: c.phone.trim().to_string(),
        })
        .filter(|c| !(c.name.is_empty() && c.email.is_empty() && c.phone.is_empty()))
}

fn proof_allowed(transaction: &Transaction, account_id: u64) -> Result<(), CoreError> {
    if transaction.user_id != Some(account_id) {
        return Err(CoreError::Forbidden(
            "Only the payer can upload proof for this transaction".to_string(),
        ));
    }
    if transaction.admin_verified
        || !matches!(
            transaction.payment_status,
            PaymentStatus::Pending | PaymentStatus::Processing
        )
    {
        return Err(CoreError::Conflict(format!(
            "transaction {} is already {}",
            transaction.id,
            transaction.payment_status.as_str()
        )));
    }
    Ok(())
}

impl Backoffice {
    // =========================================================================
    // OPENING
    // =========================================================================

    /// Write the `pending` record for a hosted-checkout payment.
    pub fn open_provider_payment(
        &self,
        payment: NewPayment,
        reference: String,
        now: Timestamp,
    ) -> Result<Transaction, CoreError> {
        let amount = require_amount(payment.amount)?;
        self.insert_transaction(Transaction {
            id: payment.id,
            user_id: payment.user_id,
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            payment_method: PaymentMethod::Flutterwave,
            payment_status: PaymentStatus::Pending,
            provider_reference: Some(reference),
            bank_transfer_reference: None,
            payment_proof_path: None,
            admin_verified: false,
            admin_verified_at: None,
            admin_verified_by: None,
            customer: clean_customer(payment.customer),
            created_at: now,
            updated_at: now,
        })
    }

    /// Write the `pending` record for a bank transfer the customer says they made.
    pub fn open_bank_transfer(
        &self,
        payment: NewPayment,
        transfer_reference: &str,
        now: Timestamp,
    ) -> Result<Transaction, CoreError> {
        let mut errors = FieldErrors::new();
        if payment.amount.is_none_or(Money::is_zero) {
            errors.add("amount", "Amount is required");
        }
        validation::required(
            &mut errors,
            "reference",
            transfer_reference,
            "Transfer reference",
        );
        errors.into_result()?;

        self.insert_transaction(Transaction {
            id: payment.id,
            user_id: payment.user_id,
            amount: payment.amount.unwrap_or_default(),
            currency: DEFAULT_CURRENCY.to_string(),
            payment_method: PaymentMethod::BankTransfer,
            payment_status: PaymentStatus::Pending,
            provider_reference: None,
            bank_transfer_reference: Some(transfer_reference.trim().to_string()),
            payment_proof_path: None,
            admin_verified: false,
            admin_verified_at: None,
            admin_verified_by: None,
            customer: clean_customer(payment.customer),
            created_at: now,
            updated_at: now,
        })
    }

    fn insert_transaction(&self, transaction: Transaction) -> Result<Transaction, CoreError> {
        if !self.save_new(&transaction)? {
            return Err(CoreError::Conflict(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        Ok(transaction)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn transaction(&self, id: &str) -> Result<Transaction, CoreError> {
        self.load(id)?
            .ok_or_else(|| CoreError::not_found(format!("transaction {id}")))
    }

    /// Transactions newest first, optionally filtered by status.
    pub fn list_transactions(
        &self,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Transaction>, CoreError> {
        let mut transactions: Vec<Transaction> = self.load_all()?;
        if let Some(status) = status {
            transactions.retain(|t| t.payment_status == status);
        }
        transactions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(transactions)
    }

    // =========================================================================
    // STATE CHANGES
    // =========================================================================

    /// Record that the provider rejected or never answered the checkout call.
    pub fn mark_transaction_failed(
        &self,
        id: &str,
        now: Timestamp,
    ) -> Result<Transaction, CoreError> {
        self.modify(id, |transaction: &mut Transaction| {
            transaction.payment_status = PaymentStatus::Failed;
            transaction.updated_at = now;
            Ok(())
        })?
        .ok_or_else(|| CoreError::not_found(format!("transaction {id}")))
    }

    /// Whether `account_id` may attach proof to transaction `id` right now.
    ///
    /// Only the account that opened the transaction may attach proof, and
    /// only while it is still awaiting review.
    pub fn check_proof_allowed(&self, id: &str, account_id: u64) -> Result<Transaction, CoreError> {
        let transaction = self.transaction(id)?;
        proof_allowed(&transaction, account_id)?;
        Ok(transaction)
    }

    /// Attach an uploaded proof of payment to the owner's transaction.
    ///
    /// Same rules as [`Backoffice::check_proof_allowed`], checked again
    /// atomically with the write. The status moves to `processing`.
    pub fn attach_payment_proof(
        &self,
        id: &str,
        account_id: u64,
        proof_path: &str,
        now: Timestamp,
    ) -> Result<Transaction, CoreError> {
        self.modify(id, |transaction: &mut Transaction| {
            proof_allowed(transaction, account_id)?;
            transaction.payment_proof_path = Some(proof_path.to_string());
            transaction.payment_status = PaymentStatus::Processing;
            transaction.updated_at = now;
            Ok(())
        })?
        .ok_or_else(|| CoreError::not_found(format!("transaction {id}")))
    }

    /// Admin decision on a transaction.
    ///
    /// Approval completes the payment, rejection fails it. Both record who
    /// decided and when. A transaction is verified at most once, even when
    /// two admins decide at the same moment.
    pub fn verify_transaction(
        &self,
        id: &str,
        approved: bool,
        admin_id: u64,
        now: Timestamp,
    ) -> Result<Transaction, CoreError> {
        self.modify(id, |transaction: &mut Transaction| {
            if transaction.admin_verified {
                return Err(CoreError::Conflict(format!(
                    "transaction {id} was already verified"
                )));
            }
            transaction.admin_verified = true;
            transaction.admin_verified_at = Some(now);
            transaction.admin_verified_by = Some(admin_id);
            transaction.payment_status = if approved {
                PaymentStatus::Completed
            } else {
                PaymentStatus::Failed
            };
            transaction.updated_at = now;
            Ok(())
        })?
        .ok_or_else(|| CoreError::not_found(format!("transaction {id}")))
    }

    // =========================================================================
    // BANK ACCOUNTS
    // =========================================================================

    /// Bank accounts in id order; `active_only` hides deactivated ones.
    pub fn list_bank_accounts(&self, active_only: bool) -> Result<Vec<BankAccount>, CoreError> {
        let mut accounts: Vec<BankAccount> = self.load_all()?;
        if active_only {
            accounts.retain(|a| a.is_active);
        }
        Ok(accounts)
    }

    pub fn create_bank_account(&self, draft: BankAccountDraft) -> Result<BankAccount, CoreError> {
        let draft = draft.normalize()?;
        let account = BankAccount {
            id: self.next_id(Table::BankAccounts)?,
            bank_name: draft.bank_name,
            account_name: draft.account_name,
            account_number: draft.account_number,
            is_active: draft.is_active,
        };
        self.save(&account)?;
        Ok(account)
    }

    pub fn set_bank_account_active(&self, id: u64, active: bool) -> Result<BankAccount, CoreError> {
        let mut account: BankAccount = self
            .load(&numeric_key(id))?
            .ok_or_else(|| CoreError::not_found(format!("bank account {id}")))?;
        account.is_active = active;
        self.save(&account)?;
        Ok(account)
    }
}
