// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lockbox - a local, single-user encrypted credential store.
//!
//! This is the binary entry point. All vault semantics live in
//! `lockbox-vault`; this crate resolves passwords, renders output, and maps
//! failures to a one-line message and exit status 1.

mod commands;
mod prompt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use lockbox_vault::DEFAULT_PASSWORD_LENGTH;

/// Lockbox - a local, single-user encrypted credential store.
#[derive(Parser, Debug)]
#[command(name = "lockbox", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Set the master password, or change it.
    SetMaster {
        /// New master password.
        #[arg(short = 'p', long)]
        password: Option<String>,
        /// Current master password, required when changing it.
        #[arg(short = 'o', long)]
        old_password: Option<String>,
    },
    /// Unlock the vault.
    Unlock {
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Lock the vault.
    Lock,
    /// Show whether a master password is set and whether the vault is locked.
    Status,
    /// Add an entry.
    Add {
        #[arg(short, long)]
        service: String,
        #[arg(short, long)]
        identifier: String,
        /// One of username, email, api_key, secret_key.
        #[arg(short = 't', long = "type", value_name = "KIND")]
        kind: String,
        /// Value to store. Prompted for on a terminal when omitted; a random
        /// one is generated when left empty.
        #[arg(long)]
        value: Option<String>,
    },
    /// Show one entry.
    Get {
        #[arg(short, long)]
        service: String,
        #[arg(short, long)]
        identifier: String,
    },
    /// List entries grouped by service.
    List {
        /// Only show entries of this kind.
        #[arg(short = 't', long = "type", value_name = "KIND")]
        kind: Option<String>,
    },
    /// Change an entry's identifier and/or value. Prompts for both on a
    /// terminal when neither flag is given.
    Update {
        #[arg(short, long)]
        service: String,
        #[arg(short, long)]
        identifier: String,
        #[arg(long)]
        new_identifier: Option<String>,
        #[arg(long)]
        new_value: Option<String>,
    },
    /// Delete an entry.
    Delete {
        #[arg(short, long)]
        service: String,
        #[arg(short, long)]
        identifier: String,
    },
    /// Print a random password.
    Generate {
        #[arg(short, long, default_value_t = DEFAULT_PASSWORD_LENGTH)]
        length: usize,
    },
    /// Export all entries in plaintext.
    Export {
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
        /// json or csv. Inferred from the file extension when omitted.
        #[arg(short = 't', long = "type", value_name = "FORMAT")]
        format: Option<String>,
    },
    /// Import entries from a JSON or CSV export.
    Import {
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => lockbox_config::load_and_validate_path(path),
        None => lockbox_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            lockbox_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.general.log_level);

    if let Err(e) = commands::run(cli.command, &config).await {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber on stderr. `RUST_LOG` wins over the config.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lockbox={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
