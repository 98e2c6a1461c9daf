//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `db_path` is empty
    /// - `scan_window_days` is 0 or exceeds a year
    /// - `max_folders` is 0 or exceeds 50
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "db_path".into(), reason: "must not be empty".into() });
        }

        if self.scan_window_days == 0 {
            return Err(ConfigError::Invalid {
                field: "scan_window_days".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.scan_window_days > 365 {
            return Err(ConfigError::Invalid {
                field: "scan_window_days".into(),
                reason: "must not exceed 365 days".into(),
            });
        }

        if self.max_folders == 0 {
            return Err(ConfigError::Invalid { field: "max_folders".into(), reason: "must be at least 1".into() });
        }
        if self.max_folders > 50 {
            return Err(ConfigError::Invalid { field: "max_folders".into(), reason: "must not exceed 50".into() });
        }

        if self.email_sync_enabled && self.email_address.is_none() {
            tracing::warn!("email sync is enabled but no email_address is configured; sync will fail");
        }

        Ok(())
    }
}
