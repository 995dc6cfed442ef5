//! Configuration system

use crate::engine::rate_limiter::{DEFAULT_HISTORY_WINDOW, DEFAULT_TRACKING_SLOTS};
use crate::scene::BaseMaterialId;

pub use serde::{Deserialize, Serialize};

/// Configuration trait
///
/// File format is selected by extension: `.toml` or `.ron`. Loading runs
/// [`Config::validate`] so callers never see a config that passed parsing
/// but carries unusable values.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Check invariants beyond what the format enforces
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] describing the first bad value.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// [`ConfigError`] on IO failure, parse failure, an unsupported
    /// extension, or failed validation.
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        let config: Self = if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// [`ConfigError`] on IO failure, serialization failure, or an
    /// unsupported extension.
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Value failed validation
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Synchronization layer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Duration samples kept in the rate limiter's moving average
    pub history_window: usize,

    /// Concurrently tracked generation requests
    pub tracking_slots: usize,

    /// Override for the engine-reported channel count
    pub channel_count_override: Option<usize>,

    /// Queue content removal for the next update pass instead of tearing
    /// down immediately, avoiding one-frame gaps on replace
    pub deferred_removal: bool,

    /// Base material used when an engine material id cannot be resolved
    pub default_material: Option<BaseMaterialId>,

    /// Let the engine generate off-thread
    pub background_builds: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            tracking_slots: DEFAULT_TRACKING_SLOTS,
            channel_count_override: None,
            deferred_removal: false,
            default_material: None,
            background_builds: true,
        }
    }
}

impl Config for SyncConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_window == 0 {
            return Err(ConfigError::Invalid(
                "history_window must be at least 1".to_string(),
            ));
        }
        if self.tracking_slots == 0 {
            return Err(ConfigError::Invalid(
                "tracking_slots must be at least 1".to_string(),
            ));
        }
        if self.channel_count_override == Some(0) {
            return Err(ConfigError::Invalid(
                "channel_count_override must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}
