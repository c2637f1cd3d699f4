//! Session configuration
//!
//! Tuning knobs for the run loop and the proxy channel. Configurations are
//! plain serde types loadable from TOML or RON files.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

/// On-disk format of a configuration file, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn for_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(OsStr::to_str) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration trait: serde types loadable from TOML or RON files
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::for_path(path)?;
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match format {
            ConfigFormat::Toml => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            ConfigFormat::Ron => {
                ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::for_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
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
}

/// Run loop and proxy channel tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Target tick rate in Hz
    pub tick_hz: u32,

    /// Fairness cap: commands applied per tick before rendering; the
    /// remainder is deferred to the next tick so rendering is never starved
    pub max_commands_per_tick: usize,

    /// Window registry capacity
    pub max_windows: usize,

    /// Bounded wait for `create_window` replies, in milliseconds
    pub reply_timeout_ms: u64,

    /// Stop the loop after this many ticks; `None` runs until a shutdown
    /// command or a fatal error (test harnesses set this)
    pub max_ticks: Option<u64>,

    /// Log tick-rate statistics at debug level
    pub log_tick_stats: bool,
}

impl SessionConfig {
    /// Duration of one scheduling tick
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }

    /// Bounded wait applied to reply-carrying commands
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            max_commands_per_tick: 64,
            max_windows: 256,
            reply_timeout_ms: 1000,
            max_ticks: None,
            log_tick_stats: false,
        }
    }
}

impl Config for SessionConfig {}
