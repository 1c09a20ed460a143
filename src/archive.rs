//! Layout of the daily AIS archive and its local cache.
//!
//! One compressed CSV per day, e.g.
//! `https://coast.noaa.gov/htdata/CMSP/AISDataHandler/2025/ais-2025-06-26.csv.zst`

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};

use crate::config::ArchiveConfig;
use crate::errors::DredgeError;

#[derive(Debug, Clone)]
pub struct Archive {
    config: ArchiveConfig,
}

impl Archive {
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// Remote url of the file of one day
    pub fn url(&self, date: NaiveDate) -> String {
        format!(
            "{}/{}/ais-{}.csv.zst",
            self.config.base_url.trim_end_matches('/'),
            date.format("%Y"),
            date.format("%Y-%m-%d")
        )
    }

    /// Local cache path of the decompressed file of one day
    pub fn storage_path(&self, date: NaiveDate) -> PathBuf {
        self.config
            .storage_dir
            .join(format!("ais-{}.csv", date.format("%Y-%m-%d")))
    }

    /// Whether the file of one day is already cached, no download needed
    pub fn cached(&self, date: NaiveDate) -> bool {
        self.storage_path(date).is_file()
    }
}

/// Every day from `start` to `end`, both inclusive
pub fn days(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, DredgeError> {
    if start > end {
        return Err(DredgeError::InvalidTimeRange(format!(
            "start {start} is after end {end}"
        )));
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

/// Millisecond timestamps from the start of `start` to the end of `end`, UTC
pub fn day_range_ms(start: NaiveDate, end: NaiveDate) -> Result<(i64, i64), DredgeError> {
    if start > end {
        return Err(DredgeError::InvalidTimeRange(format!(
            "start {start} is after end {end}"
        )));
    }
    let first = start.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    let last = end
        .succ_opt()
        .ok_or_else(|| DredgeError::InvalidTimeRange(format!("end {end} out of range")))?
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
        - 1;
    Ok((first, last))
}
