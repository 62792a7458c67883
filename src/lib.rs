//! Core library surface for the current-account ledger.
//!
//! The store, importer, payment processor and report formatter are plain
//! functions over a `rusqlite::Connection`, so the TUI in `ui` and the tests
//! drive exactly the same code.
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod payment;
pub mod report;
pub mod ui;

pub use config::Config;
pub use db::{
    count_customers, ensure_schema, fetch_customer, fetch_customers, insert_customer, open_store,
    update_balance,
};
pub use error::LedgerError;
pub use import::{import_customers, import_file, parse_customers, ImportError};
pub use models::{Customer, ImportSummary, NewCustomer, PaymentReceipt};
pub use payment::{apply_payment, ensure_customers};
pub use report::{export_html, render_html, render_table};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
