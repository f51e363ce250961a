//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `USER_SERVICE_`, nested keys split on `__`)
//! 2. Current working directory: ./config.toml
//! 3. System directory: /etc/user-service/config.toml
//! 4. Default values
//!
//! For example `USER_SERVICE_SERVICE__PORT=9000` sets `service.port` and
//! `USER_SERVICE_PAGINATION__MAX_LIMIT=100` sets `pagination.max_limit`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::pagination::{DEFAULT_LIMIT, DEFAULT_SORTED_BY};

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "USER_SERVICE_";

/// Separator between nested keys in environment variable names
pub const ENV_SEPARATOR: &str = "__";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// List endpoint defaults
    #[serde(default)]
    pub pagination: PaginationConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_name")]
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServiceConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            port: default_port(),
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
            environment: default_environment(),
        }
    }
}

/// Defaults applied to paginated list queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when a query names none
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Largest accepted page size; larger requests are clamped (0 = no cap)
    #[serde(default)]
    pub max_limit: u64,

    /// Sort string used when a query names none
    #[serde(default = "default_sort")]
    pub default_sort: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: 0,
            default_sort: default_sort(),
        }
    }
}

// Default value functions
fn default_name() -> String {
    "user-service".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

fn default_sort() -> String {
    DEFAULT_SORTED_BY.to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Config files are merged lowest priority first, so ./config.toml
    /// overrides /etc/user-service/config.toml. Environment variables
    /// override both.
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        let config = figment.merge(Self::env()).extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Skips the search path; environment variables still apply. A missing
    /// file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Self::env())
            .extract()?;

        Ok(config)
    }

    /// Config file paths in priority order (highest first)
    fn find_config_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from("config.toml"),
            PathBuf::from("/etc/user-service/config.toml"),
        ]
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR)
    }
}
