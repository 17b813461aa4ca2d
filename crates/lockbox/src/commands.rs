// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand handlers.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use colored::Colorize;
use lockbox_config::LockboxConfig;
use lockbox_core::{IdentifierKind, LockState, LockboxError};
use lockbox_storage::Database;
use lockbox_vault::{
    export_to_writer, generate_password, import_from_reader, with_extension, TransferFormat,
    Vault, DEFAULT_PASSWORD_LENGTH,
};
use tracing::debug;

use crate::prompt;
use crate::Commands;

/// Dispatch one subcommand.
pub async fn run(command: Commands, config: &LockboxConfig) -> Result<(), LockboxError> {
    // Password generation needs no database.
    if let Commands::Generate { length } = command {
        println!("{}", generate_password(length)?);
        return Ok(());
    }

    let db = Database::open_with_config(&config.storage).await?;
    let vault = Vault::open(db, config.vault.clone()).await?;
    debug!(path = %config.storage.database_path, "vault opened");

    let result = dispatch(&vault, command, config).await;
    let closed = vault.database().close().await;
    result?;
    closed
}

async fn dispatch(
    vault: &Vault,
    command: Commands,
    config: &LockboxConfig,
) -> Result<(), LockboxError> {
    match command {
        Commands::SetMaster {
            password,
            old_password,
        } => set_master(vault, password, old_password).await,
        Commands::Unlock { password } => {
            let candidate = prompt::current_password(password, "Master password")?;
            vault.unlock(&candidate).await?;
            println!("Vault unlocked.");
            Ok(())
        }
        Commands::Lock => {
            vault.lock().await?;
            println!("Vault locked.");
            Ok(())
        }
        Commands::Status => status(vault, config).await,
        Commands::Add {
            service,
            identifier,
            kind,
            value,
        } => add(vault, &service, &identifier, &kind, value).await,
        Commands::Get {
            service,
            identifier,
        } => {
            let entry = vault.get_entry(&service, &identifier).await?;
            println!("Service:         {}", entry.service);
            println!("Identifier:      {}", entry.identifier);
            println!("Identifier type: {}", entry.identifier_kind);
            println!("Value:           {}", entry.value());
            Ok(())
        }
        Commands::List { kind } => list(vault, kind.as_deref()).await,
        Commands::Update {
            service,
            identifier,
            new_identifier,
            new_value,
        } => {
            let (new_identifier, new_value) =
                prompt::update_fields(new_identifier, new_value)?;
            vault
                .update_entry(
                    &service,
                    &identifier,
                    new_value.as_deref(),
                    new_identifier.as_deref(),
                )
                .await?;
            println!("Entry updated.");
            Ok(())
        }
        Commands::Delete {
            service,
            identifier,
        } => {
            vault.delete_entry(&service, &identifier).await?;
            println!("Entry deleted.");
            Ok(())
        }
        Commands::Export { file, format } => export(vault, &file, format.as_deref()).await,
        Commands::Import { file } => import(vault, &file).await,
        Commands::Generate { .. } => Ok(()),
    }
}

async fn set_master(
    vault: &Vault,
    password: Option<String>,
    old_password: Option<String>,
) -> Result<(), LockboxError> {
    let rotating = vault.is_master_password_set().await?;
    let old = if rotating {
        Some(prompt::current_password(
            old_password,
            "Current master password",
        )?)
    } else {
        None
    };
    let new = prompt::new_password(password, !rotating)?;

    vault.set_master_password(&new, old.as_ref()).await?;
    if rotating {
        println!("Master password changed.");
    } else {
        println!("Master password set. Run `lockbox unlock` to start adding entries.");
    }
    Ok(())
}

async fn status(vault: &Vault, config: &LockboxConfig) -> Result<(), LockboxError> {
    let password = if vault.is_master_password_set().await? {
        "set".green()
    } else {
        "not set".yellow()
    };
    let state = match vault.state().await? {
        LockState::Locked => "locked".red(),
        LockState::Unlocked => "unlocked".green(),
    };

    println!("Master password: {password}");
    println!("Vault:           {state}");
    println!("Entries:         {}", vault.entry_count().await?);
    println!("Database:        {}", config.storage.database_path);
    Ok(())
}

async fn add(
    vault: &Vault,
    service: &str,
    identifier: &str,
    kind: &str,
    value: Option<String>,
) -> Result<(), LockboxError> {
    let kind: IdentifierKind = kind.parse()?;
    let value = prompt::secret_value(value, "Value (leave empty to generate)")?
        .unwrap_or_default();
    let generated = value.is_empty();
    let value = if generated {
        generate_password(DEFAULT_PASSWORD_LENGTH)?
    } else {
        value
    };

    vault.add_entry(service, identifier, kind, &value).await?;
    if generated {
        println!("Generated value: {value}");
    }
    println!("Entry added.");
    Ok(())
}

async fn list(vault: &Vault, kind: Option<&str>) -> Result<(), LockboxError> {
    let filter = kind.map(str::parse::<IdentifierKind>).transpose()?;
    let entries = vault.list_entries(filter).await?;
    if entries.is_empty() {
        println!("No entries.");
        return Ok(());
    }

    // Entries arrive ordered by service, so a change of service starts a group.
    let mut current: Option<&str> = None;
    for entry in &entries {
        if current != Some(entry.service.as_str()) {
            println!("{}", entry.service.bold());
            current = Some(entry.service.as_str());
        }
        println!("  {}: {}", entry.identifier_kind, entry.identifier);
    }
    Ok(())
}

fn transfer_io(action: &str, path: &Path, e: std::io::Error) -> LockboxError {
    LockboxError::Transfer(format!("cannot {action} {}: {e}", path.display()))
}

async fn export(vault: &Vault, file: &Path, format: Option<&str>) -> Result<(), LockboxError> {
    let format = match format {
        Some(token) => token.parse()?,
        None if file.extension().is_some() => TransferFormat::from_path(file)?,
        None => TransferFormat::Json,
    };
    let path = with_extension(file, format);

    // Don't leave an empty file behind for a locked vault.
    if vault.state().await?.is_locked() {
        return Err(LockboxError::VaultLocked);
    }

    let out = File::create(&path).map_err(|e| transfer_io("create", &path, e))?;
    let count = export_to_writer(vault, format, BufWriter::new(out)).await?;
    println!("Exported {count} entries to {}.", path.display());
    Ok(())
}

async fn import(vault: &Vault, file: &Path) -> Result<(), LockboxError> {
    let format = TransferFormat::from_path(file)?;
    let input = File::open(file).map_err(|e| transfer_io("open", file, e))?;
    let count = import_from_reader(vault, format, BufReader::new(input)).await?;
    println!("Imported {count} entries.");
    Ok(())
}
