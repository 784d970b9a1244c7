//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod documents;
pub mod extract;
pub mod format;
pub mod process;
pub mod receipts;
pub mod serve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use rcpt_core::{Database, Lifecycle, RcptConfig};

/// Per-user configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// The explicit `--config` path, else the per-user default.
pub fn config_file_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration from `--config`, else the per-user file, else defaults.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<RcptConfig> {
    if let Some(path) = explicit {
        return RcptConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {}", path));
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config file {}", path.display());
        RcptConfig::from_file(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))
    } else {
        Ok(RcptConfig::default())
    }
}

/// Open the configured database and build a lifecycle over it.
///
/// The database handle is returned separately so callers can close it.
pub fn open_lifecycle(config: &RcptConfig) -> anyhow::Result<(Arc<Database>, Lifecycle)> {
    let db = Arc::new(
        Database::open(&config.storage.database_path).with_context(|| {
            format!(
                "Failed to open database {}",
                config.storage.database_path.display()
            )
        })?,
    );
    let lifecycle = Lifecycle::from_config(config, db.clone())?;
    Ok((db, lifecycle))
}

/// Close the database once every other handle has been dropped.
pub fn close_database(db: Arc<Database>) -> anyhow::Result<()> {
    match Arc::try_unwrap(db) {
        Ok(db) => Ok(db.close()?),
        // Still shared; the connection closes when the last handle drops
        Err(_) => Ok(()),
    }
}
