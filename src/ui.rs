//! Ratatui front-end for the ledger: a six-entry menu plus the screens and
//! modal forms each entry opens.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
