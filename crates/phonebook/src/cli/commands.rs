//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::Config;

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Store connection string (overrides DATABASE_URL)
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,
}

impl ServeCommand {
    /// Apply command line overrides on top of loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = Some(port);
        }
        if let Some(url) = &self.database_url {
            config.store.database_url = Some(url.clone());
        }
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the default configuration file path
    Path,

    /// Check a configuration file for errors
    Validate {
        /// File to check (defaults to the standard location)
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let cmd = ServeCommand {
            port: Some(8080),
            database_url: Some("memory".to_string()),
        };
        cmd.apply(&mut config);

        assert_eq!(config.server.port, Some(8080));
        assert_eq!(config.database_url(), "memory");
    }

    #[test]
    fn test_apply_without_overrides_keeps_config() {
        let mut config = Config::default();
        config.server.port = Some(3001);
        let cmd = ServeCommand {
            port: None,
            database_url: None,
        };
        cmd.apply(&mut config);

        assert_eq!(config.server.port, Some(3001));
        assert!(config.store.database_url.is_none());
    }
}
