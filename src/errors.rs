//! Errors for dredge log
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DredgeError {
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid MMSI: {0}")]
    InvalidMmsi(String),

    #[error("Unknown vessel: {0}")]
    UnknownVessel(String),

    #[error("Track mixes vessels {expected} and {found}")]
    MixedVessels { expected: u32, found: u32 },

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Zone file {path}: {message}")]
    ZoneFile { path: PathBuf, message: String },

    #[error("Position store not available: {0}")]
    NotFound(String),

    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}
