//! Typed outcomes for ledger operations. Everything except `Storage` is
//! recoverable: the shell shows it in the footer and keeps running.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Customer {0} not found.")]
    NotFound(i64),

    #[error("Cannot apply payment of {amount}: the balance of {name} ({balance}) is insufficient.")]
    InsufficientFunds {
        name: String,
        balance: f64,
        amount: f64,
    },

    #[error("No customers loaded. Import or add customers first.")]
    EmptyLedger,

    #[error("Payment amount must be a non-negative number, got {0}.")]
    InvalidAmount(f64),

    #[error("Import failed: {0}")]
    Parse(String),

    #[error("{0}")]
    Invalid(String),

    #[error("No file selected.")]
    NoFileSelected,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    /// Whether the shell can report this and carry on. Storage failures
    /// (disk full, permissions, corrupt database) end the session.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LedgerError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_fatal() {
        assert!(LedgerError::NotFound(3).is_recoverable());
        assert!(LedgerError::EmptyLedger.is_recoverable());
        assert!(LedgerError::NoFileSelected.is_recoverable());
        assert!(LedgerError::Invalid("Debt is required.".to_string()).is_recoverable());
        assert!(!LedgerError::Storage(anyhow::anyhow!("disk full")).is_recoverable());
    }

    #[test]
    fn insufficient_funds_names_the_customer() {
        let err = LedgerError::InsufficientFunds {
            name: "Ana".to_string(),
            balance: 70.0,
            amount: 1000.0,
        };
        let message = err.to_string();
        assert!(message.contains("Ana"));
        assert!(message.contains("70"));
    }
}
