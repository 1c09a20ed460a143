//! Data models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::errors::DredgeError;

/// Maritime Mobile Service Identity (MMSI)
///
/// A unique nine-digit number for identifying vessels in AIS messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mmsi(u32);

impl TryFrom<u32> for Mmsi {
    type Error = DredgeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value > 999_999_999 {
            return Err(DredgeError::InvalidMmsi(value.to_string()));
        }
        Ok(Self(value))
    }
}

impl TryFrom<i64> for Mmsi {
    type Error = DredgeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let value = u32::try_from(value).map_err(|_| DredgeError::InvalidMmsi(value.to_string()))?;
        Self::try_from(value)
    }
}

impl TryFrom<&str> for Mmsi {
    type Error = DredgeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parsed = value
            .trim()
            .parse::<u32>()
            .map_err(|_| DredgeError::InvalidMmsi(value.to_string()))?;
        Self::try_from(parsed)
    }
}

impl Mmsi {
    /// Get the raw MMSI value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Mmsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Mmsi {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for Mmsi {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u32::deserialize(deserializer)?;
        Mmsi::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// One AIS position report of a vessel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    /// Report timestamp in milliseconds from Unix epoch
    pub timestamp_ms: i64,
    /// Latitude in WGS84 format in decimal degrees
    pub latitude: f64,
    /// Longitude in WGS84 format in decimal degrees
    pub longitude: f64,
    /// Speed over ground in knots, None if not available
    pub speed_over_ground: Option<f64>,
    /// Course over ground in degrees, None if not available
    pub course_over_ground: Option<f64>,
    /// Heading in degrees, None if not available
    pub heading: Option<f64>,
    pub mmsi: Mmsi,
}

impl PositionReport {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// Time ordered position reports of a single vessel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    mmsi: Option<Mmsi>,
    reports: Vec<PositionReport>,
}

impl Track {
    /// Build a track, sorting reports by timestamp.
    ///
    /// The sort is stable, so reports sharing a timestamp keep their
    /// insertion order. All reports must belong to the same vessel.
    pub fn new(mut reports: Vec<PositionReport>) -> Result<Self, DredgeError> {
        let mmsi = reports.first().map(|r| r.mmsi);
        if let Some(expected) = mmsi {
            if let Some(other) = reports.iter().find(|r| r.mmsi != expected) {
                return Err(DredgeError::MixedVessels {
                    expected: expected.value(),
                    found: other.mmsi.value(),
                });
            }
        }
        reports.sort_by_key(|r| r.timestamp_ms);
        Ok(Self { mmsi, reports })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Vessel of the track, None for an empty track
    pub fn mmsi(&self) -> Option<Mmsi> {
        self.mmsi
    }

    pub fn reports(&self) -> &[PositionReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Kind of a project zone, resolved from the zone file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoneKind {
    Centerline,
    DigArea,
    DisposalArea,
    TrackOverlay,
}

impl ZoneKind {
    pub const ALL: [ZoneKind; 4] = [
        ZoneKind::Centerline,
        ZoneKind::DigArea,
        ZoneKind::DisposalArea,
        ZoneKind::TrackOverlay,
    ];

    /// Resolve the kind from a zone file name
    ///
    /// - `cl_` = centerline
    /// - `dig_` = dig area
    /// - `disp_` = disposal area
    /// - `track` = track overlay
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.starts_with("cl_") {
            Some(ZoneKind::Centerline)
        } else if name.starts_with("dig_") {
            Some(ZoneKind::DigArea)
        } else if name.starts_with("disp_") {
            Some(ZoneKind::DisposalArea)
        } else if name.starts_with("track") {
            Some(ZoneKind::TrackOverlay)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneKind::Centerline => "centerline",
            ZoneKind::DigArea => "dig-area",
            ZoneKind::DisposalArea => "disposal-area",
            ZoneKind::TrackOverlay => "track-overlay",
        }
    }

    /// Display color on the map
    pub fn color(&self) -> &'static str {
        match self {
            ZoneKind::Centerline => "black",
            ZoneKind::DigArea => "red",
            ZoneKind::DisposalArea => "magenta",
            ZoneKind::TrackOverlay => "gray",
        }
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneKind {
    type Err = DredgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoneKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DredgeError::ConfigurationError {
                message: format!("Unknown zone kind '{s}'"),
            })
    }
}

/// Operational activity of a dredge at one report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Delay,
    Dig,
    Disp,
    Sail,
}

impl Activity {
    pub const ALL: [Activity; 4] = [
        Activity::Delay,
        Activity::Dig,
        Activity::Disp,
        Activity::Sail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Delay => "delay",
            Activity::Dig => "dig",
            Activity::Disp => "disp",
            Activity::Sail => "sail",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Activity::Delay => "orange",
            Activity::Dig => "green",
            Activity::Disp => "magenta",
            Activity::Sail => "blue",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position report with the derived classification fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedReport {
    pub report: PositionReport,
    /// Milliseconds since the previous report, None for the first one
    pub duration_ms: Option<i64>,
    /// Centered rolling mean of speed over ground in knots
    pub smoothed_speed: Option<f64>,
    /// Location zone containing the report
    pub zone: Option<ZoneKind>,
    pub activity: Activity,
}

/// Deserializers for raw AIS columns
pub(crate) mod serde_helpers {
    use serde::{self, Deserialize, Deserializer};

    fn filter_sentinel<'de, D>(deserializer: D, sentinel: f64) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.filter(|v| v.is_finite() && *v != sentinel))
    }

    /// Speed over ground, None if not available (=102.3)
    pub fn deserialize_sog<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(filter_sentinel(deserializer, 102.3)?.filter(|v| *v >= 0.0))
    }

    /// Course over ground, None if not available (=360)
    pub fn deserialize_cog<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        filter_sentinel(deserializer, 360.0)
    }

    /// Heading, None if not available (=511)
    pub fn deserialize_heading<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        filter_sentinel(deserializer, 511.0)
    }
}
