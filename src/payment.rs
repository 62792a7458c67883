//! Applying payments against a customer's stored balance.

use anyhow::Context;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{count_customers, fetch_customer, update_balance};
use crate::error::LedgerError;
use crate::models::PaymentReceipt;

/// Draw `amount` from the customer's balance.
///
/// The lookup and the write share one transaction, so the balance checked is
/// the balance overwritten. A payment that would leave the balance below zero
/// is refused without touching the row. Debt is written back exactly as it was
/// read: paying never changes what the customer owes.
pub fn apply_payment(
    conn: &mut Connection,
    customer_id: i64,
    amount: f64,
) -> Result<PaymentReceipt, LedgerError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(LedgerError::InvalidAmount(amount));
    }

    let tx = conn
        .transaction()
        .context("failed to start payment transaction")?;

    let customer = fetch_customer(&tx, customer_id)?.ok_or(LedgerError::NotFound(customer_id))?;

    let new_balance = customer.balance - amount;
    if new_balance < 0.0 {
        warn!(
            customer_id,
            amount,
            balance = customer.balance,
            "payment refused: insufficient balance"
        );
        return Err(LedgerError::InsufficientFunds {
            name: customer.name,
            balance: customer.balance,
            amount,
        });
    }

    update_balance(&tx, customer_id, new_balance, customer.debt)?;
    tx.commit().context("failed to commit payment")?;

    info!(customer_id, amount, new_balance, "payment applied");
    Ok(PaymentReceipt {
        customer_id,
        name: customer.name,
        amount,
        previous_balance: customer.balance,
        debt: customer.debt,
        new_balance,
    })
}

/// Gate for operations that only make sense once the ledger has customers.
/// Returns the current count.
pub fn ensure_customers(conn: &Connection) -> Result<i64, LedgerError> {
    match count_customers(conn)? {
        0 => Err(LedgerError::EmptyLedger),
        count => Ok(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ensure_schema, fetch_customers, insert_customer};
    use crate::models::NewCustomer;

    fn store_with(customers: &[(&str, f64, f64)]) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        for (name, balance, debt) in customers {
            insert_customer(&conn, &NewCustomer::new(name, *balance, *debt).unwrap()).unwrap();
        }
        conn
    }

    fn balances(conn: &Connection) -> Vec<(f64, f64)> {
        fetch_customers(conn)
            .unwrap()
            .into_iter()
            .map(|c| (c.balance, c.debt))
            .collect()
    }

    #[test]
    fn ana_pays_then_overdraws() {
        let mut conn = store_with(&[("Ana", 100.0, 50.0)]);

        let receipt = apply_payment(&mut conn, 1, 30.0).unwrap();
        assert_eq!(receipt.name, "Ana");
        assert_eq!(receipt.amount, 30.0);
        assert_eq!(receipt.previous_balance, 100.0);
        assert_eq!(receipt.new_balance, 70.0);
        assert_eq!(receipt.debt, 50.0);
        assert_eq!(balances(&conn), vec![(70.0, 50.0)]);

        let err = apply_payment(&mut conn, 1, 1000.0).unwrap_err();
        match err {
            LedgerError::InsufficientFunds { name, balance, amount } => {
                assert_eq!(name, "Ana");
                assert_eq!(balance, 70.0);
                assert_eq!(amount, 1000.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(balances(&conn), vec![(70.0, 50.0)]);
    }

    #[test]
    fn paying_the_whole_balance_leaves_zero() {
        let mut conn = store_with(&[("Ana", 25.0, 10.0)]);
        let receipt = apply_payment(&mut conn, 1, 25.0).unwrap();
        assert_eq!(receipt.new_balance, 0.0);
        assert_eq!(balances(&conn), vec![(0.0, 10.0)]);
    }

    #[test]
    fn zero_payment_is_accepted() {
        let mut conn = store_with(&[("Ana", 25.0, 10.0)]);
        let receipt = apply_payment(&mut conn, 1, 0.0).unwrap();
        assert_eq!(receipt.new_balance, 25.0);
    }

    #[test]
    fn unknown_customer_changes_nothing() {
        let mut conn = store_with(&[("Ana", 100.0, 50.0), ("Luis", 5.0, 0.0)]);
        let err = apply_payment(&mut conn, 9, 1.0).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(9)));
        assert_eq!(balances(&conn), vec![(100.0, 50.0), (5.0, 0.0)]);
    }

    #[test]
    fn only_the_paying_customer_changes() {
        let mut conn = store_with(&[("Ana", 100.0, 50.0), ("Luis", 5.0, 0.0)]);
        apply_payment(&mut conn, 2, 2.5).unwrap();
        assert_eq!(balances(&conn), vec![(100.0, 50.0), (2.5, 0.0)]);
    }

    #[test]
    fn negative_and_non_finite_amounts_are_rejected() {
        let mut conn = store_with(&[("Ana", 100.0, 50.0)]);
        for amount in [-1.0, f64::NAN, f64::INFINITY] {
            let err = apply_payment(&mut conn, 1, amount).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount(_)));
        }
        assert_eq!(balances(&conn), vec![(100.0, 50.0)]);
    }

    #[test]
    fn empty_ledger_is_gated() {
        let mut conn = store_with(&[]);
        assert!(matches!(
            ensure_customers(&conn),
            Err(LedgerError::EmptyLedger)
        ));
        assert!(matches!(
            apply_payment(&mut conn, 1, 1.0),
            Err(LedgerError::NotFound(1))
        ));

        let conn = store_with(&[("Ana", 1.0, 0.0), ("Luis", 1.0, 0.0)]);
        assert_eq!(ensure_customers(&conn).unwrap(), 2);
    }
}
