mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, CycleConfig, ForecastConfig};
pub use database::{Database, StoredForecast};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `CYCLETRACK_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/cycletrack[-dev]/`, chosen by `CYCLETRACK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("CYCLETRACK_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CYCLETRACK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cycletrack-dev")
            } else {
                base_dir.join("cycletrack")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
