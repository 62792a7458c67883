//! Runtime paths. Defaults live in the working directory so the ledger file
//! sits next to wherever the tool is launched from; environment variables
//! override each path individually.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// SQLite file name used when `LEDGER_DB` is unset.
const DB_FILE_NAME: &str = "ledger.sqlite";
/// HTML export written by the report screen when `LEDGER_EXPORT` is unset.
const EXPORT_FILE_NAME: &str = "customers.html";
/// Log file name used when `LEDGER_LOG` is unset.
const LOG_FILE_NAME: &str = "ledger.log";

const DB_ENV: &str = "LEDGER_DB";
const EXPORT_ENV: &str = "LEDGER_EXPORT";
const LOG_ENV: &str = "LEDGER_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub export_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    /// Resolve every path from the environment, falling back to the current
    /// working directory.
    pub fn from_env() -> Result<Self> {
        let cwd = env::current_dir().context("failed to resolve working directory")?;
        let defaults = Self::in_dir(&cwd);
        Ok(Self {
            db_path: path_override(DB_ENV).unwrap_or(defaults.db_path),
            export_path: path_override(EXPORT_ENV).unwrap_or(defaults.export_path),
            log_path: path_override(LOG_ENV).unwrap_or(defaults.log_path),
        })
    }

    /// Default file names placed under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            db_path: dir.join(DB_FILE_NAME),
            export_path: dir.join(EXPORT_FILE_NAME),
            log_path: dir.join(LOG_FILE_NAME),
        }
    }
}

fn path_override(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_dir_uses_default_file_names() {
        let config = Config::in_dir(Path::new("/tmp/ledger"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/ledger/ledger.sqlite"));
        assert_eq!(config.export_path, PathBuf::from("/tmp/ledger/customers.html"));
        assert_eq!(config.log_path, PathBuf::from("/tmp/ledger/ledger.log"));
    }
}
