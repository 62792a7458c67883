//! Persistence module split across logical submodules.

mod connection;
mod customers;

pub use connection::{ensure_schema, open_store};
pub use customers::{
    count_customers, fetch_customer, fetch_customers, insert_customer, update_balance,
};
