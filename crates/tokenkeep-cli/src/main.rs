//! tokenkeep - restore, refresh and inspect a persisted auth session.
//!
//! Drives `SessionStore` from the command line. `restore` exits non-zero
//! when there is no usable session so scripts can branch to a login flow.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tokenkeep_core::{Config, RestoreMode, SessionStore, StorageBackend};

#[derive(Parser)]
#[command(name = "tokenkeep")]
#[command(about = "Persist and refresh an authentication session")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Identity service base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Directory holding storage.json
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Keep tokens in the OS keychain instead of storage.json
    #[arg(long)]
    keyring: bool,

    /// Return the stored session without contacting the server
    #[arg(long)]
    trust_local: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Restore the stored session, refreshing the access token if expired
    Restore,

    /// Store a session record for the given tokens
    Login {
        access_token: String,
        refresh_token: String,
    },

    /// Remove the stored session and any split-key tokens
    Logout,

    /// Store tokens under separate accessToken/refreshToken keys
    SetTokens {
        access_token: String,
        refresh_token: String,
    },

    /// Print the split-key tokens
    Tokens,

    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn effective_config(cli: &Cli) -> Result<Config> {
    let config = Config::load().context("Failed to load configuration")?;
    Ok(apply_flags(cli, config))
}

/// Command-line flags take precedence over the config file and environment
fn apply_flags(cli: &Cli, mut config: Config) -> Config {
    if let Some(ref url) = cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(ref dir) = cli.storage_dir {
        config.storage_dir = Some(dir.clone());
    }
    if cli.keyring {
        config.storage_backend = StorageBackend::Keyring;
    }
    if cli.trust_local {
        config.restore_mode = RestoreMode::TrustLocal;
    }
    config
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    let config = effective_config(&cli)?;
    debug!(api = %config.api_base_url, backend = ?config.storage_backend, "Configuration loaded");

    let store = SessionStore::from_config(&config)?;
    debug!(mode = ?store.mode(), "Session store ready");

    match cli.command {
        Commands::Restore => match store.restore_session().await {
            Ok(session) => {
                println!("{}", serde_json::to_string_pretty(&session)?);
            }
            Err(e) => {
                eprintln!("No session: {}", e);
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Login {
            access_token,
            refresh_token,
        } => {
            store.persist_session(&access_token, &refresh_token)?;
            info!("Session stored");
        }
        Commands::Logout => {
            store.clear_session()?;
            store.clear_tokens()?;
            info!("Session cleared");
        }
        Commands::SetTokens {
            access_token,
            refresh_token,
        } => {
            store.set_tokens(&access_token, &refresh_token)?;
        }
        Commands::Tokens => match store.credentials() {
            Ok(credentials) => {
                println!("{}", serde_json::to_string_pretty(&credentials)?);
            }
            Err(e) => {
                eprintln!("{}", e);
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Config { save } => {
            if save {
                config.save().context("Failed to save configuration")?;
                info!("Configuration saved");
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
