//! API configuration module.
//!
//! Configuration is layered with the `config` crate:
//! built-in defaults, then an optional `stockroom.toml`, then `STOCKROOM_*`
//! environment variables (e.g. `STOCKROOM_PORT=9000`).

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use stockroom_core::MIN_PASSWORD_LEN;
use stockroom_db::DbConfig;

/// Base name of the optional config file (`stockroom.toml`).
pub const CONFIG_FILE: &str = "stockroom";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "STOCKROOM";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// Connection attempts at startup
    pub connect_retries: u32,

    /// Delay between connection attempts in seconds
    pub connect_retry_delay_secs: u64,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Requests running longer than this are aborted
    pub request_timeout_secs: u64,

    /// Directory uploaded images are written to
    pub upload_dir: String,

    /// Public URL prefix under which `/uploads` is reachable
    pub public_base_url: String,

    /// Admin created on first start when no user exists
    pub bootstrap_admin_username: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "./stockroom.db".to_string(),
            max_connections: 5,
            connect_retries: 5,
            connect_retry_delay_secs: 5,
            // In production, this MUST be set via STOCKROOM_JWT_SECRET
            jwt_secret: "stockroom-dev-secret-change-in-production".to_string(),
            jwt_lifetime_secs: 24 * 60 * 60,
            request_timeout_secs: 30,
            upload_dir: "./uploads".to_string(),
            public_base_url: "http://localhost:8080/uploads".to_string(),
            bootstrap_admin_username: None,
            bootstrap_admin_password: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from defaults, `stockroom.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&ApiConfig::default())?)
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: ApiConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the type system does not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("request_timeout_secs".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }

        match (&self.bootstrap_admin_username, &self.bootstrap_admin_password) {
            (Some(_), Some(password)) if password.chars().count() < MIN_PASSWORD_LEN => {
                Err(ConfigError::InvalidValue("bootstrap_admin_password".to_string()))
            }
            (Some(_), None) => Err(ConfigError::MissingRequired(
                "bootstrap_admin_password".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::MissingRequired(
                "bootstrap_admin_username".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Database settings derived from this config.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .connect_retries(
                self.connect_retries,
                Duration::from_secs(self.connect_retry_delay_secs),
            )
    }

    /// Bootstrap admin credentials, when both are configured.
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_admin_username, &self.bootstrap_admin_password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.bootstrap_admin().is_none());
    }

    #[test]
    fn test_bootstrap_needs_both_halves() {
        let config = ApiConfig {
            bootstrap_admin_username: Some("admin".to_string()),
            ..ApiConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(field)) if field == "bootstrap_admin_password"
        ));

        let config = ApiConfig {
            bootstrap_admin_username: Some("admin".to_string()),
            bootstrap_admin_password: Some("short".to_string()),
            ..ApiConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let config = ApiConfig {
            bootstrap_admin_username: Some("admin".to_string()),
            bootstrap_admin_password: Some("change-me-now".to_string()),
            ..ApiConfig::default()
        };
        assert_eq!(config.bootstrap_admin(), Some(("admin", "change-me-now")));
    }

    #[test]
    fn test_rejects_empty_secret() {
        let config = ApiConfig {
            jwt_secret: "  ".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }
}
