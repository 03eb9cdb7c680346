//! Engine configuration loader for Chorus.
//!
//! Reads `chorus.toml` from the data directory (`~/.chorus/` in production)
//! and deserializes it into [`EngineConfig`]. Falls back to defaults when
//! the file is missing, unreadable, malformed, or fails validation.

use std::path::{Path, PathBuf};

use chorus_types::config::EngineConfig;

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "chorus.toml";

/// `~/.chorus`, or `./.chorus` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chorus")
}

/// Load engine configuration from `{data_dir}/chorus.toml`.
///
/// - If the file does not exist, returns [`EngineConfig::default()`].
/// - If the file cannot be read or parsed, logs a warning and returns the default.
/// - If the parsed config fails [`EngineConfig::validate`], logs a warning
///   and returns the default.
pub async fn load_engine_config(data_dir: &Path) -> EngineConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {CONFIG_FILE} found at {}, using defaults", config_path.display());
            return EngineConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return EngineConfig::default();
        }
    };

    let config = match toml::from_str::<EngineConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            return EngineConfig::default();
        }
    };

    match config.validate() {
        Ok(()) => {
            tracing::debug!(
                agents = config.agents.len(),
                "Loaded configuration from {}",
                config_path.display()
            );
            config
        }
        Err(err) => {
            tracing::warn!("Invalid {}: {err}, using defaults", config_path.display());
            EngineConfig::default()
        }
    }
}

/// Render a configuration as TOML, for `chorus config`.
pub fn render_config(config: &EngineConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}
