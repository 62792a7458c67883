use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::models::{Customer, NewCustomer};

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        balance: row.get(2)?,
        debt: row.get(3)?,
    })
}

/// Append a customer row, returning the hydrated struct with the id SQLite
/// assigned.
pub fn insert_customer(conn: &Connection, customer: &NewCustomer) -> Result<Customer> {
    conn.execute(
        "INSERT INTO customers (name, balance, debt) VALUES (?1, ?2, ?3)",
        params![customer.name, customer.balance, customer.debt],
    )
    .context("failed to insert customer")?;

    let id = conn.last_insert_rowid();
    debug!(id, name = %customer.name, "customer inserted");
    Ok(Customer {
        id,
        name: customer.name.clone(),
        balance: customer.balance,
        debt: customer.debt,
    })
}

/// Point lookup by id.
pub fn fetch_customer(conn: &Connection, id: i64) -> Result<Option<Customer>> {
    conn.query_row(
        "SELECT id, name, balance, debt FROM customers WHERE id = ?1",
        params![id],
        customer_from_row,
    )
    .optional()
    .context("failed to load customer")
}

/// Overwrite balance and debt for one customer. Returns the number of rows
/// touched; an unknown id touches none and is not an error here, so callers
/// that care must look the customer up first.
pub fn update_balance(conn: &Connection, id: i64, balance: f64, debt: f64) -> Result<usize> {
    let updated = conn
        .execute(
            "UPDATE customers SET balance = ?1, debt = ?2 WHERE id = ?3",
            params![balance, debt, id],
        )
        .context("failed to update customer balance")?;

    debug!(id, balance, debt, updated, "customer balance written");
    Ok(updated)
}

pub fn count_customers(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))
        .context("failed to count customers")
}

/// Retrieve every customer in insertion order.
pub fn fetch_customers(conn: &Connection) -> Result<Vec<Customer>> {
    let mut stmt = conn
        .prepare("SELECT id, name, balance, debt FROM customers ORDER BY id")
        .context("failed to prepare customer query")?;

    let customers = stmt
        .query_map([], customer_from_row)
        .context("failed to load customers")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect customers")?;

    Ok(customers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn draft(name: &str, balance: f64, debt: f64) -> NewCustomer {
        NewCustomer::new(name, balance, debt).unwrap()
    }

    #[test]
    fn inserted_customer_reads_back_exactly() {
        let conn = store();
        let created = insert_customer(&conn, &draft("Ana", 100.0, 50.0)).unwrap();
        assert_eq!(created.id, 1);

        let fetched = fetch_customer(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Ana");
        assert_eq!(fetched.balance, 100.0);
        assert_eq!(fetched.debt, 50.0);
    }

    #[test]
    fn ids_are_assigned_sequentially() {
        let conn = store();
        let first = insert_customer(&conn, &draft("Ana", 1.0, 0.0)).unwrap();
        let second = insert_customer(&conn, &draft("Ana", 2.0, 0.0)).unwrap();
        assert_eq!(second.id, first.id + 1);
    }

    #[test]
    fn missing_customer_is_none() {
        let conn = store();
        assert!(fetch_customer(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn update_balance_on_unknown_id_is_a_no_op() {
        let conn = store();
        insert_customer(&conn, &draft("Ana", 100.0, 50.0)).unwrap();

        assert_eq!(update_balance(&conn, 99, 1.0, 2.0).unwrap(), 0);
        let ana = fetch_customer(&conn, 1).unwrap().unwrap();
        assert_eq!((ana.balance, ana.debt), (100.0, 50.0));
    }

    #[test]
    fn update_balance_overwrites_both_fields() {
        let conn = store();
        insert_customer(&conn, &draft("Ana", 100.0, 50.0)).unwrap();

        assert_eq!(update_balance(&conn, 1, 70.0, 45.0).unwrap(), 1);
        let ana = fetch_customer(&conn, 1).unwrap().unwrap();
        assert_eq!((ana.balance, ana.debt), (70.0, 45.0));
    }

    #[test]
    fn fetch_customers_preserves_insertion_order() {
        let conn = store();
        let names = ["Zoe", "Ana", "Marco", "Ana"];
        for (idx, name) in names.iter().enumerate() {
            insert_customer(&conn, &draft(name, idx as f64 * 10.0, idx as f64)).unwrap();
        }
        update_balance(&conn, 2, 5.5, 1.0).unwrap();

        let customers = fetch_customers(&conn).unwrap();
        assert_eq!(customers.len(), names.len());
        assert_eq!(count_customers(&conn).unwrap(), names.len() as i64);
        for (idx, customer) in customers.iter().enumerate() {
            assert_eq!(customer.id, idx as i64 + 1);
            assert_eq!(customer.name, names[idx]);
        }
        assert_eq!(customers[1].balance, 5.5);
        assert_eq!(customers[3].balance, 30.0);
        assert_eq!(customers[3].debt, 3.0);
    }
}
