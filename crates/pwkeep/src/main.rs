// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! pwkeep - a password-derived, tamper-evident keychain.
//!
//! This is the binary entry point.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pwkeep_config::PwkeepConfig;
use pwkeep_core::PwkeepError;
use pwkeep_keychain::{
    RecordStore, get_master_password, get_master_password_with_confirm, read_secret_value,
};
use secrecy::SecretString;

/// pwkeep - a password-derived, tamper-evident keychain.
#[derive(Parser, Debug)]
#[command(name = "pwkeep", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new, empty keychain.
    Init {
        /// Replace an existing keychain.
        #[arg(long)]
        force: bool,
    },
    /// Store a value under a name.
    Set {
        name: String,
        /// The value (prompted for, or read from stdin, when omitted).
        #[arg(long)]
        value: Option<String>,
    },
    /// Print the value stored under a name.
    Get {
        name: String,
        /// Show only a masked preview.
        #[arg(long)]
        mask: bool,
    },
    /// Delete the value stored under a name.
    Remove { name: String },
    /// Write the keychain record to a file and print its checksum.
    Export { path: PathBuf },
    /// Verify a record by loading it, then make it the stored keychain.
    Import {
        path: PathBuf,
        /// Trusted checksum (defaults to the sidecar next to the file).
        #[arg(long)]
        checksum: Option<String>,
    },
    /// Check the stored keychain against its checksum and password.
    Verify,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => pwkeep_config::load_and_validate_path(path),
        None => pwkeep_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            pwkeep_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log.level);

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &PwkeepConfig) -> Result<ExitCode, PwkeepError> {
    let store = RecordStore::from_config(&config.store);
    let keychain_config = &config.keychain;

    match command {
        Commands::Init { force } => {
            let password = get_master_password_with_confirm()?;
            commands::run_init(&store, keychain_config, password, force).await?;
            eprintln!("keychain created at {}", store.record_path().display());
        }
        Commands::Set { name, value } => {
            let password = get_master_password()?;
            let value = match value {
                Some(value) => SecretString::from(value),
                None => read_secret_value(&name)?,
            };
            commands::run_set(&store, keychain_config, password, &name, &value).await?;
        }
        Commands::Get { name, mask } => {
            let password = get_master_password()?;
            match commands::run_get(&store, keychain_config, password, &name, mask).await? {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("{name}: not found");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Remove { name } => {
            let password = get_master_password()?;
            if !commands::run_remove(&store, keychain_config, password, &name).await? {
                eprintln!("{name}: not found");
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Export { path } => {
            let password = get_master_password()?;
            let checksum =
                commands::run_export(&store, keychain_config, password, &path).await?;
            println!("{checksum}");
        }
        Commands::Import { path, checksum } => {
            let password = get_master_password()?;
            let entries =
                commands::run_import(&store, keychain_config, password, &path, checksum).await?;
            eprintln!("imported {entries} entries");
        }
        Commands::Verify => {
            let password = get_master_password()?;
            let entries = commands::run_verify(&store, keychain_config, password).await?;
            println!("ok: {entries} entries");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Initialize the tracing subscriber with an env filter on stderr.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pwkeep={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
