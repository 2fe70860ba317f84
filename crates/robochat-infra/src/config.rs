//! Configuration loader for robochat.
//!
//! Reads `config.toml` (by default from `~/.config/robochat/`) and
//! deserializes it into [`RobotConfig`]. Falls back to defaults when the
//! file is missing or malformed, but refuses values the engine cannot run
//! with.

use std::path::{Path, PathBuf};

use robochat_types::config::RobotConfig;
use robochat_types::error::ConfigError;

/// Directory name under the platform config dir.
const APP_DIR: &str = "robochat";

/// Default location of the config file: `{config_dir}/robochat/config.toml`,
/// or `./config.toml` when the platform has no config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`RobotConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and returns the default.
/// - If the parsed (or default) config fails validation, returns the validation error.
pub async fn load_config(path: &Path) -> Result<RobotConfig, ConfigError> {
    let config = match tokio::fs::read_to_string(path).await {
        Ok(content) => parse_or_default(path, &content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            RobotConfig::default()
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            RobotConfig::default()
        }
    };

    config.validate()?;
    Ok(config)
}

/// Strict variant used when the user named the file explicitly: every
/// failure is an error instead of a silent fallback.
pub async fn load_config_strict(path: &Path) -> Result<RobotConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let config: RobotConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    config.validate()?;
    Ok(config)
}

fn parse_or_default(path: &Path, content: &str) -> RobotConfig {
    match toml::from_str::<RobotConfig>(content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            RobotConfig::default()
        }
    }
}

/// Render the effective configuration as TOML. The API key is never included.
pub fn render_config(config: &RobotConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::Invalid(e.to_string()))
}
