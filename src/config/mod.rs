//! Configuration module for the campaign backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Admin secret used when `ADMIN_PASSWORD` is unset. Local development only.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Remote store toggles, built once at startup and handed to the stores.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Base URL of the hosted PostgREST endpoint
    pub supabase_url: Option<String>,
    /// Public key used for reads
    pub anon_key: Option<String>,
    /// Privileged key used for writes
    pub service_role_key: Option<String>,
    /// Directory holding the local fallback JSON files
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Credentials for the remote read path, if configured.
    pub fn remote_read(&self) -> Option<(&str, &str)> {
        Some((self.supabase_url.as_deref()?, self.anon_key.as_deref()?))
    }

    /// Credentials for the remote write path, if configured.
    pub fn remote_write(&self) -> Option<(&str, &str)> {
        Some((
            self.supabase_url.as_deref()?,
            self.service_role_key.as_deref()?,
        ))
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret for admin mutations
    pub admin_password: String,
    /// Remote and local store settings
    pub storage: StorageConfig,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Upper bound for the outbound map link fetch
    pub map_fetch_timeout: Duration,
    /// Location shown when a map link cannot be resolved
    pub default_location: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = StorageConfig {
            supabase_url: non_empty("SUPABASE_URL"),
            anon_key: non_empty("SUPABASE_ANON_KEY"),
            service_role_key: non_empty("SUPABASE_SERVICE_ROLE_KEY"),
            data_dir: lookup("CAMPAIGN_DATA_DIR")
                .unwrap_or_else(|| "./data".to_string())
                .into(),
        };

        let admin_password =
            non_empty("ADMIN_PASSWORD").unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());

        let raw_addr = lookup("CAMPAIGN_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let bind_addr = raw_addr.parse().map_err(|_| ConfigError::Invalid {
            key: "CAMPAIGN_BIND_ADDR",
            value: raw_addr.clone(),
        })?;

        let log_level = lookup("CAMPAIGN_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = lookup("CAMPAIGN_LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        let map_fetch_timeout = match lookup("CAMPAIGN_MAP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| ConfigError::Invalid {
                key: "CAMPAIGN_MAP_TIMEOUT_SECS",
                value: raw.clone(),
            })?),
            None => Duration::from_secs(10),
        };

        let default_location =
            non_empty("CAMPAIGN_DEFAULT_LOCATION").unwrap_or_else(|| "Phnom Penh".to_string());

        Ok(Self {
            admin_password,
            storage,
            bind_addr,
            log_level,
            log_json,
            map_fetch_timeout,
            default_location,
        })
    }

    /// Whether the insecure built-in admin secret is in effect.
    pub fn uses_default_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}
