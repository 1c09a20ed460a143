//! AIS report store.
//!
//! Raw reports live in `ais_data`, every imported file is recorded in
//! `uploaded_files` so the same file is never loaded twice, and `vessel_data`
//! keeps vessel names for display.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{error, info};

use crate::config::VesselConfig;
use crate::errors::DredgeError;
use crate::ingest::RawReport;
use crate::models::{Mmsi, PositionReport, Track};

/// Result of importing one raw file
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Loaded { file_id: i64, rows: usize },
    AlreadyLoaded { upload_date: DateTime<Utc> },
}

/// Rows, time span and vessels of one imported file
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub rows: i64,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub mmsi: Vec<i64>,
}

impl FileSummary {
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start_ms.and_then(DateTime::from_timestamp_millis)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end_ms.and_then(DateTime::from_timestamp_millis)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AisRow {
    utc_timestamp_ms: i64,
    longitude: f64,
    latitude: f64,
    sog: Option<f64>,
    cog: Option<f64>,
    heading: Option<f64>,
    mmsi: i64,
}

impl TryFrom<AisRow> for PositionReport {
    type Error = DredgeError;

    fn try_from(row: AisRow) -> Result<Self, Self::Error> {
        Ok(PositionReport {
            timestamp_ms: row.utc_timestamp_ms,
            latitude: row.latitude,
            longitude: row.longitude,
            speed_over_ground: row.sog,
            course_over_ground: row.cog,
            heading: row.heading,
            mmsi: Mmsi::try_from(row.mmsi)?,
        })
    }
}

/// Report store backed by SQLite
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Wrap an existing pool and bring the schema up to date
    pub async fn new(pool: SqlitePool) -> Result<Self, DredgeError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Open an existing database, failing with `NotFound` when it is missing
    pub async fn from_url(url: &str) -> Result<Self, DredgeError> {
        Self::connect(url, false).await
    }

    /// Open a database, creating the file when needed
    pub async fn create(url: &str) -> Result<Self, DredgeError> {
        Self::connect(url, true).await
    }

    async fn connect(url: &str, create_if_missing: bool) -> Result<Self, DredgeError> {
        info!("Opening AIS database at {url}");
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(create_if_missing);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to open database {url}: {e}");
                DredgeError::NotFound(format!("{url}: {e}"))
            })?;
        Self::new(pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Load the track of a vessel between two timestamps, both inclusive.
    ///
    /// Reports without a position are skipped. No matching reports gives an
    /// empty track.
    pub async fn load_track(
        &self,
        mmsi: Mmsi,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Track, DredgeError> {
        if start_ms > end_ms {
            return Err(DredgeError::InvalidTimeRange(format!(
                "start {start_ms} is after end {end_ms}"
            )));
        }

        let rows: Vec<AisRow> = sqlx::query_as(
            "SELECT utc_timestamp_ms, longitude, latitude, sog, cog, heading, mmsi
             FROM ais_data
             WHERE mmsi = ?1
               AND utc_timestamp_ms >= ?2
               AND utc_timestamp_ms <= ?3
               AND longitude IS NOT NULL
               AND latitude IS NOT NULL
             ORDER BY utc_timestamp_ms, rowid",
        )
        .bind(i64::from(mmsi.value()))
        .bind(start_ms)
        .bind(end_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        info!(
            "Loaded {} reports of vessel {mmsi} between {start_ms} and {end_ms}",
            rows.len()
        );

        let reports = rows
            .into_iter()
            .map(PositionReport::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Track::new(reports)
    }

    /// Upload date of a file, None when it has not been loaded
    pub async fn uploaded_file(
        &self,
        filename: &str,
    ) -> Result<Option<DateTime<Utc>>, DredgeError> {
        let upload_date = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT upload_date FROM uploaded_files WHERE filename = ?1",
        )
        .bind(filename)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(upload_date)
    }

    /// Record a file and insert its reports in one transaction
    pub async fn import_reports(
        &self,
        filename: &str,
        reports: &[RawReport],
    ) -> Result<ImportOutcome, DredgeError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let existing: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT upload_date FROM uploaded_files WHERE filename = ?1")
                .bind(filename)
                .fetch_optional(&mut *tx)
                .await?;
        if let Some(upload_date) = existing {
            return Ok(ImportOutcome::AlreadyLoaded { upload_date });
        }

        let file_id =
            sqlx::query("INSERT INTO uploaded_files (filename, upload_date) VALUES (?1, ?2)")
                .bind(filename)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();

        for report in reports {
            sqlx::query(
                "INSERT INTO ais_data (
                    utc_timestamp_ms, status, longitude, latitude,
                    sog, cog, heading, file_id, mmsi
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .bind(report.utc_timestamp_ms)
            .bind(report.status)
            .bind(report.longitude)
            .bind(report.latitude)
            .bind(report.sog)
            .bind(report.cog)
            .bind(report.heading)
            .bind(file_id)
            .bind(i64::from(report.mmsi.value()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Imported {} reports from {filename} as file {file_id}", reports.len());

        Ok(ImportOutcome::Loaded {
            file_id,
            rows: reports.len(),
        })
    }

    pub async fn file_summary(&self, file_id: i64) -> Result<FileSummary, DredgeError> {
        let (rows, start_ms, end_ms): (i64, Option<i64>, Option<i64>) = sqlx::query_as(
            "SELECT COUNT(*), MIN(utc_timestamp_ms), MAX(utc_timestamp_ms)
             FROM ais_data WHERE file_id = ?1",
        )
        .bind(file_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        let mmsi = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT mmsi FROM ais_data WHERE file_id = ?1 ORDER BY mmsi",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(FileSummary {
            rows,
            start_ms,
            end_ms,
            mmsi,
        })
    }

    /// Store vessel names, replacing earlier names of the same MMSI
    pub async fn store_vessels(&self, vessels: &[VesselConfig]) -> Result<(), DredgeError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;
        for vessel in vessels {
            sqlx::query(
                "INSERT INTO vessel_data (mmsi, name) VALUES (?1, ?2)
                 ON CONFLICT (mmsi) DO UPDATE SET name = excluded.name",
            )
            .bind(i64::from(vessel.mmsi))
            .bind(vessel.name.trim().to_uppercase())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn vessel_name(&self, mmsi: Mmsi) -> Result<Option<String>, DredgeError> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM vessel_data WHERE mmsi = ?1")
            .bind(i64::from(mmsi.value()))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(name)
    }
}

/// Connection level failures mean the store is not available
fn store_error(e: sqlx::Error) -> DredgeError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DredgeError::NotFound(e.to_string())
        }
        e => DredgeError::DatabaseError(e),
    }
}
