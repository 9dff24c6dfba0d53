//! Configuration management for phonebook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::StoreLocation;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "phonebook";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "phonebook.db";

/// Default directory for the static front end.
const STATIC_DIR_NAME: &str = "dist";

/// Prefix for namespaced environment variables.
const ENV_PREFIX: &str = "PHONEBOOK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. The bare `PORT` and `DATABASE_URL` environment variables
/// 2. Environment variables prefixed with `PHONEBOOK_` (`__` separates sections)
/// 3. TOML config file at `~/.config/phonebook/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Record store configuration.
    pub store: StoreConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to listen on. There is no default: the server refuses to start
    /// without one.
    pub port: Option<u16>,
    /// Allow cross-origin requests from any origin.
    pub cors: bool,
    /// Directory served for unmatched paths, if it exists.
    pub static_dir: Option<PathBuf>,
    /// Largest accepted request body.
    pub body_limit_bytes: usize,
}

/// Record store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection string for the store.
    /// Defaults to `~/.local/share/phonebook/phonebook.db`
    pub database_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: None,
            cors: true,
            static_dir: Some(PathBuf::from(STATIC_DIR_NAME)),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config: Config = Self::figment(config_path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The merged provider stack, before extraction.
    #[must_use]
    pub fn figment(config_path: Option<PathBuf>) -> Figment {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let platform_env = Env::raw()
            .only(&["PORT", "DATABASE_URL"])
            .map(|key| {
                if key.as_str().eq_ignore_ascii_case("port") {
                    "server.port".into()
                } else {
                    "store.database_url".into()
                }
            });

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(platform_env)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// A missing port is not an error here; it is reported by
    /// [`Config::socket_addr`] when the server starts.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.body_limit_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "body_limit_bytes must be greater than 0".to_string(),
            });
        }

        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(Error::ConfigValidation {
                message: format!("invalid host address: {}", self.server.host),
            });
        }

        if let Some(url) = &self.store.database_url {
            StoreLocation::parse(url)?;
        }

        Ok(())
    }

    /// Get the listen port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPort`] if no port was configured.
    pub fn port(&self) -> Result<u16> {
        self.server.port.ok_or(Error::MissingPort)
    }

    /// Get the address to bind.
    ///
    /// # Errors
    ///
    /// Returns an error if the port is unset or the host is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let port = self.port()?;
        let host: IpAddr = self.server.host.parse().map_err(|_| Error::ConfigValidation {
            message: format!("invalid host address: {}", self.server.host),
        })?;
        Ok(SocketAddr::new(host, port))
    }

    /// Get the store connection string, resolving defaults if not set.
    #[must_use]
    pub fn database_url(&self) -> String {
        self.store.database_url.clone().unwrap_or_else(|| {
            Self::default_data_dir()
                .join(DATABASE_FILE_NAME)
                .display()
                .to_string()
        })
    }
}
