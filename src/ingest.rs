//! Import of raw AIS exports in Port Houston format.
//!
//! Columns: `longitude, latitude, MMSI, SPEED, HEADING, COURSE, STATUS, TIMESTAMP`
//! where `TIMESTAMP` is UTC milliseconds from Unix epoch.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::database::{Database, ImportOutcome};
use crate::errors::DredgeError;
use crate::models::serde_helpers::*;
use crate::models::Mmsi;

/// One row of a raw AIS export
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawReport {
    #[serde(rename = "TIMESTAMP")]
    pub utc_timestamp_ms: i64,
    #[serde(rename = "MMSI")]
    pub mmsi: Mmsi,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(rename = "SPEED", default, deserialize_with = "deserialize_sog")]
    pub sog: Option<f64>,
    #[serde(rename = "COURSE", default, deserialize_with = "deserialize_cog")]
    pub cog: Option<f64>,
    #[serde(rename = "HEADING", default, deserialize_with = "deserialize_heading")]
    pub heading: Option<f64>,
    #[serde(rename = "STATUS", default)]
    pub status: Option<i64>,
}

/// Parsed rows of a raw export file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortFile {
    pub reports: Vec<RawReport>,
    /// Rows that failed to parse and were left out
    pub skipped: usize,
}

/// Parse a raw export file.
///
/// A row that fails to parse is logged and skipped, the rest of the file is
/// kept. Only read failures are errors.
pub fn read_port_file(path: &Path) -> Result<PortFile, DredgeError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut file = PortFile::default();
    for row in reader.deserialize::<RawReport>() {
        match row {
            Ok(report) => file.reports.push(report),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                warn!("Skipping row on line {line} of {}: {e}", path.display());
                file.skipped += 1;
            }
        }
    }
    Ok(file)
}

/// Import one file unless it was already loaded earlier
pub async fn import_file(db: &Database, path: &Path) -> Result<ImportOutcome, DredgeError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DredgeError::IoError(std::io::Error::other("invalid file name")))?;

    if let Some(upload_date) = db.uploaded_file(filename).await? {
        info!("File {filename} already loaded on {upload_date}");
        return Ok(ImportOutcome::AlreadyLoaded { upload_date });
    }

    let file = read_port_file(path)?;
    let outcome = db.import_reports(filename, &file.reports).await?;

    if let ImportOutcome::Loaded { file_id, rows } = outcome {
        let summary = db.file_summary(file_id).await?;
        info!(
            "AIS data in {filename}: {rows} rows spanning {:?} to {:?}, vessels {:?}, {} rows skipped",
            summary.start(),
            summary.end(),
            summary.mmsi,
            file.skipped
        );
    }

    Ok(outcome)
}

/// Import every `*.csv` file of a directory in file name order.
///
/// A file that fails to import is logged and skipped.
pub async fn import_directory(
    db: &Database,
    dir: &Path,
) -> Result<Vec<(String, ImportOutcome)>, DredgeError> {
    let mut paths = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .collect::<Vec<_>>();
    paths.sort();

    let mut outcomes = Vec::new();
    for path in paths {
        let name = path.display().to_string();
        info!("Loading AIS data from {name}");
        match import_file(db, &path).await {
            Ok(outcome) => outcomes.push((name, outcome)),
            Err(e) => warn!("Failed to import {name}: {e}"),
        }
    }
    Ok(outcomes)
}
