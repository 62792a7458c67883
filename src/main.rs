//! Binary entry point: resolve paths, start logging, open the ledger, and
//! drive the TUI until the user exits. Fatal storage errors surface here
//! after the terminal has been restored.
use current_account::logging::init_logging;
use current_account::{open_store, run_app, App, Config};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.log_path)?;

    let conn = open_store(&config.db_path)?;
    let mut app = App::new(conn, config);
    run_app(&mut app)
}
