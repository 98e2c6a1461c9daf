//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TRACCIA_*)
//! 2. TOML config file (if TRACCIA_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The config object is passed explicitly into whatever consumes it; nothing
//! in the workspace reads ambient global state.

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TRACCIA_*)
/// 2. TOML config file (if TRACCIA_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite order database.
    ///
    /// Set via TRACCIA_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Mailbox address used for email sync.
    ///
    /// Set via TRACCIA_EMAIL_ADDRESS. Required only when sync runs.
    #[serde(default)]
    pub email_address: Option<String>,

    /// Whether the email sync workflow is enabled.
    ///
    /// Set via TRACCIA_EMAIL_SYNC_ENABLED.
    #[serde(default)]
    pub email_sync_enabled: bool,

    /// How many days back to search each mailbox folder.
    ///
    /// Set via TRACCIA_SCAN_WINDOW_DAYS.
    #[serde(default = "default_scan_window_days")]
    pub scan_window_days: u32,

    /// Upper bound on mailbox folders scanned per sync pass.
    ///
    /// Bounds IMAP round-trips; some servers drop connections that walk too
    /// many folders. Set via TRACCIA_MAX_FOLDERS.
    #[serde(default = "default_max_folders")]
    pub max_folders: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./traccia.sqlite")
}

fn default_scan_window_days() -> u32 {
    30
}

fn default_max_folders() -> usize {
    15
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            email_address: None,
            email_sync_enabled: false,
            scan_window_days: default_scan_window_days(),
            max_folders: default_max_folders(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TRACCIA_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TRACCIA_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check that a mailbox address is configured (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no address is set.
    pub fn require_email_address(&self) -> Result<&str, ConfigError> {
        self.email_address.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "email_address".into(),
            hint: "Set TRACCIA_EMAIL_ADDRESS environment variable".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./traccia.sqlite"));
        assert_eq!(config.scan_window_days, 30);
        assert_eq!(config.max_folders, 15);
        assert!(!config.email_sync_enabled);
        assert!(config.email_address.is_none());
    }

    #[test]
    fn test_require_email_address_missing() {
        let config = AppConfig::default();
        let result = config.require_email_address();
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_require_email_address_present() {
        let config = AppConfig { email_address: Some("utente@example.com".into()), ..Default::default() };
        assert_eq!(config.require_email_address().unwrap(), "utente@example.com");
    }
}
