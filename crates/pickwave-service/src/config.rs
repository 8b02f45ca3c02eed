//! # Service Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     PICKWAVE_DB_PATH=/var/lib/pickwave/pickwave.db                      │
//! │     PICKWAVE_CLAIM_MAX_ATTEMPTS=8                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/pickwave/service.toml (Linux)                             │
//! │     ~/Library/Application Support/com.pickwave.pickwave/service.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # service.toml
//! [database]
//! path = "/var/lib/pickwave/pickwave.db"
//! max_connections = 8
//! connect_timeout_secs = 30
//!
//! [claim]
//! max_attempts = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use pickwave_db::DbConfig;

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file, created if missing.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "pickwave", "pickwave")
        .map(|dirs| dirs.data_dir().join("pickwave.db"))
        .unwrap_or_else(|| PathBuf::from("pickwave.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Claim Settings
// =============================================================================

/// How hard `find_batch` tries when other workers keep winning the race.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    5
}

impl Default for ClaimSettings {
    fn default() -> Self {
        ClaimSettings {
            max_attempts: default_max_attempts(),
        }
    }
}

// =============================================================================
// Service Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub claim: ClaimSettings,
}

impl ServiceConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (service.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ServiceResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading service config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load service config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "database.path must not be empty".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ServiceError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.claim.max_attempts == 0 {
            return Err(ServiceError::InvalidConfig(
                "claim.max_attempts must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("PICKWAVE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("PICKWAVE_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.database.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring invalid PICKWAVE_DB_MAX_CONNECTIONS"),
            }
        }

        if let Ok(timeout) = std::env::var("PICKWAVE_DB_CONNECT_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.database.connect_timeout_secs = t,
                Err(_) => warn!(value = %timeout, "Ignoring invalid PICKWAVE_DB_CONNECT_TIMEOUT_SECS"),
            }
        }

        if let Ok(attempts) = std::env::var("PICKWAVE_CLAIM_MAX_ATTEMPTS") {
            match attempts.parse::<u32>() {
                Ok(a) => {
                    debug!(max_attempts = a, "Overriding claim attempts from environment");
                    self.claim.max_attempts = a;
                }
                Err(_) => warn!(value = %attempts, "Ignoring invalid PICKWAVE_CLAIM_MAX_ATTEMPTS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pickwave", "pickwave")
            .map(|dirs| dirs.config_dir().join("service.toml"))
    }

    /// Pool configuration for [`pickwave_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }
}
