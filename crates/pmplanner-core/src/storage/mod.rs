mod config;
pub mod fixture;
pub mod memory;
pub mod migrations;
pub mod schedule_db;

pub use config::{Config, LogisticsConfig, SchedulingConfig};
pub use fixture::Fixture;
pub use memory::MemoryStore;
pub use schedule_db::ScheduleDb;

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/pmplanner[-dev]/` based on PMPLANNER_ENV.
///
/// Set PMPLANNER_ENV=dev to use the development data directory, or
/// PMPLANNER_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("PMPLANNER_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("PMPLANNER_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pmplanner-dev")
            } else {
                base_dir.join("pmplanner")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
