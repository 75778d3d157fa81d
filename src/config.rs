use std::path::Path;

use log::warn;

use crate::ai::EngineConfig;
use crate::error::ConfigError;
use crate::session::PlayConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub play: PlayConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        if !engine.thinking_time_secs.is_finite() || engine.thinking_time_secs < 0.0 {
            return Err(ConfigError::Validation(
                "engine.thinking_time_secs must be a finite number >= 0".into(),
            ));
        }
        if engine.quick_win_horizon == 0 {
            return Err(ConfigError::Validation(
                "engine.quick_win_horizon must be >= 1".into(),
            ));
        }
        if engine.defense_horizon == 0 {
            return Err(ConfigError::Validation(
                "engine.defense_horizon must be >= 1".into(),
            ));
        }
        if engine.table_buckets == 0 {
            return Err(ConfigError::Validation(
                "engine.table_buckets must be > 0".into(),
            ));
        }

        let play = &self.play;
        if play.engine_symbol == play.opponent_symbol {
            return Err(ConfigError::Validation(
                "play.engine_symbol and play.opponent_symbol must differ".into(),
            ));
        }
        if [play.engine_symbol, play.opponent_symbol]
            .iter()
            .any(|symbol| symbol.is_whitespace() || *symbol == '.')
        {
            return Err(ConfigError::Validation(
                "play symbols must be visible and not '.'".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}
