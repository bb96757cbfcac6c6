mod config;

pub use config::{ApiConfig, Config, SchedulingConfig};

use std::path::PathBuf;

/// Returns `~/.config/studybuilder[-dev]/` based on STUDYBUILDER_ENV.
///
/// Set STUDYBUILDER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYBUILDER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studybuilder-dev")
    } else {
        base_dir.join("studybuilder")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
