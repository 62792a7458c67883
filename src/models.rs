//! Domain models that mirror the SQLite schema and get passed between the
//! store, the payment processor, the report formatter, and the TUI. They stay
//! plain data holders so the other layers own persistence and presentation.

use std::path::PathBuf;

use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq)]
/// A row of the `customers` table.
pub struct Customer {
    /// Primary key assigned by SQLite. Never changes once the row exists.
    pub id: i64,
    /// Display name. Not unique.
    pub name: String,
    /// Funds available to be drawn down by payments.
    pub balance: f64,
    /// Amount owed. Set on creation; payments leave it untouched.
    pub debt: f64,
}

#[derive(Debug, Clone, PartialEq)]
/// A customer that has not been persisted yet. Both the XML importer and the
/// manual-entry form produce these before handing them to the store.
pub struct NewCustomer {
    pub name: String,
    pub balance: f64,
    pub debt: f64,
}

impl NewCustomer {
    /// Validate and normalize raw values. The name is trimmed and must not be
    /// empty; both amounts must be finite.
    pub fn new(name: &str, balance: f64, debt: f64) -> Result<Self, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Invalid("Customer name is required.".to_string()));
        }
        if !balance.is_finite() {
            return Err(LedgerError::Invalid(format!(
                "Balance must be a finite number, got {balance}."
            )));
        }
        if !debt.is_finite() {
            return Err(LedgerError::Invalid(format!(
                "Debt must be a finite number, got {debt}."
            )));
        }
        Ok(Self {
            name: name.to_string(),
            balance,
            debt,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Everything the shell needs to report after a successful payment.
pub struct PaymentReceipt {
    pub customer_id: i64,
    pub name: String,
    pub amount: f64,
    pub previous_balance: f64,
    /// Debt exactly as stored; a payment never changes it.
    pub debt: f64,
    pub new_balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
/// Outcome of a completed import.
pub struct ImportSummary {
    pub source: PathBuf,
    pub inserted: usize,
}
