// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plaintext import and export of vault entries as JSON or CSV.
//!
//! Exported files contain decrypted values. Both directions go through the
//! vault's entry operations, so they obey the same lock gating.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use lockbox_core::{IdentifierKind, LockboxError};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::info;

use crate::Vault;

/// Exact CSV header row.
pub const CSV_HEADER: [&str; 4] = ["Service", "Identifier", "Identifier Type", "Value"];

/// Supported interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TransferFormat {
    Json,
    Csv,
}

impl TransferFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, LockboxError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for TransferFormat {
    type Err = LockboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(LockboxError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Replace or append the format's extension.
///
/// `backup` becomes `backup.json`; `backup.txt` becomes `backup.json`.
pub fn with_extension(path: &Path, format: TransferFormat) -> PathBuf {
    path.with_extension(format.extension())
}

/// One exported entry.
#[derive(Debug, Serialize, Deserialize)]
struct TransferRecord {
    #[serde(alias = "Service")]
    service: String,
    #[serde(alias = "Identifier")]
    identifier: String,
    #[serde(alias = "IdentifierType")]
    identifier_type: String,
    #[serde(alias = "Value")]
    value: String,
}

/// Write every entry in `format`. Returns the number written.
pub async fn export_to_writer<W: Write>(
    vault: &Vault,
    format: TransferFormat,
    writer: W,
) -> Result<usize, LockboxError> {
    let records: Vec<TransferRecord> = vault
        .list_entries(None)
        .await?
        .into_iter()
        .map(|entry| TransferRecord {
            identifier_type: entry.identifier_kind.as_str().to_string(),
            value: entry.value().to_string(),
            service: entry.service,
            identifier: entry.identifier,
        })
        .collect();

    match format {
        TransferFormat::Json => write_json(&records, writer)?,
        TransferFormat::Csv => write_csv(&records, writer)?,
    }

    info!(format = %format, count = records.len(), "entries exported");
    Ok(records.len())
}

fn write_json<W: Write>(records: &[TransferRecord], mut writer: W) -> Result<(), LockboxError> {
    serde_json::to_writer_pretty(&mut writer, records)
        .map_err(|e| LockboxError::Transfer(format!("failed to write JSON: {e}")))?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .map_err(|e| LockboxError::Transfer(format!("failed to write JSON: {e}")))
}

fn write_csv<W: Write>(records: &[TransferRecord], writer: W) -> Result<(), LockboxError> {
    let csv_err = |e: csv::Error| LockboxError::Transfer(format!("failed to write CSV: {e}"));

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(CSV_HEADER).map_err(csv_err)?;
    for record in records {
        out.write_record([
            record.service.as_str(),
            record.identifier.as_str(),
            record.identifier_type.as_str(),
            record.value.as_str(),
        ])
        .map_err(csv_err)?;
    }
    out.flush()
        .map_err(|e| LockboxError::Transfer(format!("failed to write CSV: {e}")))
}

/// Read entries in `format` and add them in order.
///
/// Stops at the first failing record; records added before it remain.
/// Returns the number of entries added.
pub async fn import_from_reader<R: Read>(
    vault: &Vault,
    format: TransferFormat,
    reader: R,
) -> Result<usize, LockboxError> {
    if vault.state().await?.is_locked() {
        return Err(LockboxError::VaultLocked);
    }

    let records = match format {
        TransferFormat::Json => read_json(reader)?,
        TransferFormat::Csv => read_csv(reader)?,
    };

    let mut added = 0;
    for (index, record) in records.into_iter().enumerate() {
        let record_number = index + 1;
        let record = record.map_err(|e| failed(record_number, e))?;
        let kind = IdentifierKind::from_str(&record.identifier_type)
            .map_err(|e| failed(record_number, e))?;
        vault
            .add_entry(&record.service, &record.identifier, kind, &record.value)
            .await
            .map_err(|e| failed(record_number, e))?;
        added += 1;
    }

    info!(format = %format, count = added, "entries imported");
    Ok(added)
}

fn failed(record: usize, source: LockboxError) -> LockboxError {
    LockboxError::ImportFailed {
        record,
        source: Box::new(source),
    }
}

type ParsedRecords = Vec<Result<TransferRecord, LockboxError>>;

fn read_json<R: Read>(reader: R) -> Result<ParsedRecords, LockboxError> {
    let records: Vec<TransferRecord> = serde_json::from_reader(reader)
        .map_err(|e| LockboxError::Transfer(format!("invalid JSON export: {e}")))?;
    Ok(records.into_iter().map(Ok).collect())
}

/// Parses the header eagerly; row errors are deferred so earlier rows still
/// import before the failing one is reported.
fn read_csv<R: Read>(reader: R) -> Result<ParsedRecords, LockboxError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| LockboxError::Transfer(format!("invalid CSV header: {e}")))?;
    let matches = headers.len() == CSV_HEADER.len()
        && headers
            .iter()
            .zip(CSV_HEADER)
            .all(|(found, expected)| found.trim() == expected);
    if !matches {
        let found: Vec<&str> = headers.iter().collect();
        return Err(LockboxError::Transfer(format!(
            "unexpected CSV header `{}` (expected `{}`)",
            found.join(","),
            CSV_HEADER.join(",")
        )));
    }

    Ok(rdr
        .records()
        .map(|row| {
            let row = row.map_err(|e| LockboxError::Transfer(format!("invalid CSV row: {e}")))?;
            let field = |i: usize| row.get(i).unwrap_or_default().to_string();
            Ok(TransferRecord {
                service: field(0),
                identifier: field(1),
                identifier_type: field(2),
                value: field(3),
            })
        })
        .collect())
}
