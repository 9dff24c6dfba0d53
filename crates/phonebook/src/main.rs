//! `phonebook` - CLI for the phonebook service
//!
//! Runs the HTTP server and inspects its configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tracing::info;

use phonebook::cli::{Cli, Command, ConfigCommand, ServeCommand};
use phonebook::{init_logging, open_store, Config, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match cli.command {
        Command::Serve(serve_cmd) => serve(cli.config, &serve_cmd).await,
        Command::Config(config_cmd) => handle_config(cli.config, config_cmd),
    }
}

async fn serve(config_path: Option<std::path::PathBuf>, cmd: &ServeCommand) -> anyhow::Result<()> {
    let mut config = Config::load_from(config_path).context("loading configuration")?;
    cmd.apply(&mut config);
    config.validate()?;

    // Fail before touching the database if there is nowhere to listen.
    config.port()?;

    let url = config.database_url();
    info!("Connecting to store at {url}");
    let store = open_store(&url).with_context(|| format!("opening store {url}"))?;

    Server::new(&config, store)?.run().await?;
    Ok(())
}

fn handle_config(
    config_path: Option<std::path::PathBuf>,
    cmd: ConfigCommand,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Host:               {}", config.server.host);
                match config.server.port {
                    Some(port) => println!("  Port:               {port}"),
                    None => println!("  Port:               (unset)"),
                }
                println!("  CORS:               {}", config.server.cors);
                match &config.server.static_dir {
                    Some(dir) => println!("  Static dir:         {}", dir.display()),
                    None => println!("  Static dir:         (none)"),
                }
                println!("  Body limit (bytes): {}", config.server.body_limit_bytes);
                println!();
                println!("[Store]");
                println!("  Database URL:       {}", config.database_url());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.or(config_path).unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => anyhow::bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
