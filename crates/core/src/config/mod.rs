//! Configuration for the admin core
//!
//! Settings live in `urtadmin.toml` inside the server's base directory. A
//! default file is written on first start; edits take effect on
//! [`CoreConfig::reload_from`].
//!
//! # Example
//!
//! ```ignore
//! use urtadmin_core::config::CoreConfig;
//!
//! let config = CoreConfig::load_from("/srv/urt/q3ut4".as_ref())?;
//! println!("Chat prefix: {}", config.chat_prefix);
//! ```

mod loader;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use loader::{core_config_path, default_base_dir, resolve_data_path, CONFIG_FILE_NAME};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write a config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Could not determine the base directory
    #[error("Base directory not available - could not resolve server path")]
    NoBaseDirectory,

    /// A value is outside its allowed range
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Core admin configuration.
///
/// Loaded from `<base_dir>/urtadmin.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    /// Master switch for chat commands
    pub commands_enabled: bool,

    /// Prefix that marks a chat line as a command
    pub chat_prefix: String,

    /// Highest level `setlevel` accepts
    pub max_level: i32,

    /// Minimum level listed by `!admins`
    pub admin_list_min_level: i32,

    /// Cap on rows returned by name lookups
    pub lookup_limit: usize,

    /// Name given to players whose name is empty or belongs to someone else
    pub placeholder_name: String,

    /// Names that can never be registered or promoted
    pub reserved_names: Vec<String>,

    /// SQLite file, relative to the base directory unless absolute
    pub database_file: String,

    /// Level table file, relative to the base directory unless absolute
    pub command_levels_file: String,

    /// How long a caller waits for the store worker
    pub store_timeout_ms: u64,

    /// Pending store requests before new ones are refused
    pub store_queue_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            commands_enabled: true,
            chat_prefix: "!".to_string(),
            max_level: 5,
            admin_list_min_level: 3,
            lookup_limit: 20,
            placeholder_name: "Newbie".to_string(),
            reserved_names: vec!["Newbie".to_string(), "UnnamedPlayer".to_string()],
            database_file: "UrTDataBase.db".to_string(),
            command_levels_file: "commands.cfg".to_string(),
            store_timeout_ms: 2000,
            store_queue_capacity: 256,
        }
    }
}

impl CoreConfig {
    /// Load config from `base_dir`, creating a default file if missing.
    pub fn load_from(base_dir: &Path) -> ConfigResult<Self> {
        let path = core_config_path(base_dir);

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            tracing::debug!("Loaded core config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save_to(base_dir)?;
            tracing::info!("Created default core config at {:?}", path);
            Ok(default)
        }
    }

    /// Save config to `base_dir`.
    pub fn save_to(&self, base_dir: &Path) -> ConfigResult<()> {
        let path = core_config_path(base_dir);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        tracing::debug!("Saved core config to {:?}", path);
        Ok(())
    }

    /// Reload config from `base_dir`.
    ///
    /// On error the current values are kept.
    pub fn reload_from(&mut self, base_dir: &Path) -> ConfigResult<()> {
        let path = core_config_path(base_dir);
        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        *self = config;
        tracing::debug!("Reloaded core config from {:?}", path);
        Ok(())
    }

    /// Check ranges that serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_level < 1 {
            return Err(ConfigError::InvalidValue {
                field: "max_level",
                reason: format!("must be at least 1, got {}", self.max_level),
            });
        }
        if self.chat_prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "chat_prefix",
                reason: "must not be empty".to_string(),
            });
        }
        if self.lookup_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lookup_limit",
                reason: "must be positive".to_string(),
            });
        }
        if self.store_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store_queue_capacity",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Whether `name` (already cleaned) is on the reserved list
    pub fn is_reserved_name(&self, name: &str) -> bool {
        self.reserved_names
            .iter()
            .any(|reserved| crate::text::eq_ignore_case(reserved, name))
    }

    pub fn database_path(&self, base_dir: &Path) -> PathBuf {
        resolve_data_path(base_dir, &self.database_file)
    }

    pub fn command_levels_path(&self, base_dir: &Path) -> PathBuf {
        resolve_data_path(base_dir, &self.command_levels_file)
    }

    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_timeout_ms)
    }
}
