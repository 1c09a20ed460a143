//! Project zones: channel centerlines, dig areas, disposal areas and
//! display-only track overlays.

use std::fs;
use std::path::Path;

use geo::{Coord, Intersects, LineString, Point, Polygon};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::DredgeError;
use crate::models::ZoneKind;
use crate::projection::{Crs, WORKING_CRS};

#[derive(Debug, Clone, PartialEq)]
pub enum ZoneGeometry {
    Polygon(Polygon<f64>),
    Line(LineString<f64>),
}

/// Named zone with geometry in [`WORKING_CRS`]
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub kind: ZoneKind,
    pub geometry: ZoneGeometry,
    /// Mile marker stations along a centerline, one per vertex
    pub stations: Option<Vec<f64>>,
    area: Polygon<f64>,
}

impl Zone {
    pub fn new(name: impl Into<String>, kind: ZoneKind, geometry: ZoneGeometry) -> Self {
        // Lines are closed into polygons for containment tests
        let area = match &geometry {
            ZoneGeometry::Polygon(polygon) => polygon.clone(),
            ZoneGeometry::Line(line) => Polygon::new(line.clone(), vec![]),
        };
        Self {
            name: name.into(),
            kind,
            geometry,
            stations: None,
            area,
        }
    }

    pub fn with_stations(mut self, stations: Vec<f64>) -> Self {
        self.stations = Some(stations);
        self
    }

    /// Whether the point lies inside or on the boundary of the zone.
    ///
    /// Track overlays are display only and never contain anything.
    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.kind != ZoneKind::TrackOverlay && self.area.intersects(point)
    }

    pub fn color(&self) -> &'static str {
        self.kind.color()
    }
}

/// Row of a projected coordinate file
#[derive(Debug, Deserialize)]
struct GridRow {
    #[serde(rename = "E", alias = "e")]
    easting: f64,
    #[serde(rename = "N", alias = "n")]
    northing: f64,
    #[serde(rename = "Station", alias = "station", default)]
    station: Option<f64>,
}

/// Row of a geographic position export
#[derive(Debug, Deserialize)]
struct PositionRow {
    #[serde(rename = "Latitude", alias = "latitude", alias = "LAT")]
    latitude: f64,
    #[serde(rename = "Longitude", alias = "longitude", alias = "LON")]
    longitude: f64,
}

/// Immutable collection of project zones
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// Load every zone file of a directory.
    ///
    /// One zone per file, the kind is coded in the file name prefix. Files with
    /// an unknown format or prefix, or that fail to parse, are skipped with a
    /// warning. Only an unreadable directory is an error.
    pub fn from_directory(dir: &Path, source_crs: Crs) -> Result<Self, DredgeError> {
        let mut paths = fs::read_dir(dir)
            .map_err(|e| DredgeError::ZoneFile {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect::<Vec<_>>();
        paths.sort();

        let mut zones = Vec::new();
        for path in paths {
            match Self::read_zone_file(&path, source_crs) {
                Ok(Some(zone)) => {
                    debug!("Loaded {} zone {} from {}", zone.kind, zone.name, path.display());
                    zones.push(zone);
                }
                Ok(None) => {}
                Err(e) => warn!("Removing {} from the project zones: {}", path.display(), e),
            }
        }

        info!(
            "Loaded {} zones from {} (source {}, working {})",
            zones.len(),
            dir.display(),
            source_crs,
            WORKING_CRS
        );
        Ok(Self { zones })
    }

    /// Read one zone file, None when the file is not a recognized zone file
    fn read_zone_file(path: &Path, source_crs: Crs) -> Result<Option<Zone>, DredgeError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv {
            warn!("File type not recognized for file {file_name}, removing from the project zones");
            return Ok(None);
        }
        let Some(kind) = ZoneKind::from_file_name(file_name) else {
            warn!("Zone kind not recognized for file {file_name}, removing from the project zones");
            return Ok(None);
        };
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string();

        let zone_error = |message: String| DredgeError::ZoneFile {
            path: path.to_path_buf(),
            message,
        };

        let zone = match kind {
            ZoneKind::TrackOverlay => {
                // Position exports carry geographic coordinates whatever the project system
                let line: LineString<f64> = read_rows::<PositionRow>(path)?
                    .iter()
                    .map(|r| Coord {
                        x: r.longitude,
                        y: r.latitude,
                    })
                    .collect();
                if line.0.len() < 2 {
                    return Err(zone_error("track needs at least two positions".to_string()));
                }
                Zone::new(name, kind, ZoneGeometry::Line(Crs::Wgs84.to_working(&line)))
            }
            ZoneKind::Centerline => {
                let rows = read_rows::<GridRow>(path)?;
                let line = source_crs.to_working(&grid_line(&rows));
                if line.0.len() < 2 {
                    return Err(zone_error("centerline needs at least two points".to_string()));
                }
                let stations: Option<Vec<f64>> = rows.iter().map(|r| r.station).collect();
                let zone = Zone::new(name, kind, ZoneGeometry::Line(line));
                match stations {
                    Some(stations) => zone.with_stations(stations),
                    None => {
                        warn!("Centerline {file_name} has no complete station column");
                        zone
                    }
                }
            }
            ZoneKind::DisposalArea | ZoneKind::DigArea => {
                let rows = read_rows::<GridRow>(path)?;
                let line = source_crs.to_working(&grid_line(&rows));
                if line.0.len() < 3 {
                    return Err(zone_error("area needs at least three points".to_string()));
                }
                // Disposal outlines stay lines and are closed on containment tests
                let geometry = if kind == ZoneKind::DigArea {
                    ZoneGeometry::Polygon(Polygon::new(line, vec![]))
                } else {
                    ZoneGeometry::Line(line)
                };
                Zone::new(name, kind, geometry)
            }
        };
        Ok(Some(zone))
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn by_kind(&self, kind: ZoneKind) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(move |z| z.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Zone kind the point is located in.
    ///
    /// Only `location_kinds` are considered. Without a priority list the last
    /// containing kind in `location_kinds` order wins, otherwise the first
    /// containing kind of `priority`.
    pub fn locate(
        &self,
        point: &Point<f64>,
        location_kinds: &[ZoneKind],
        priority: Option<&[ZoneKind]>,
    ) -> Option<ZoneKind> {
        let hits: Vec<ZoneKind> = location_kinds
            .iter()
            .copied()
            .filter(|kind| self.by_kind(*kind).any(|z| z.contains(point)))
            .collect();

        if hits.len() > 1 {
            debug!(
                "Point ({}, {}) is inside overlapping zones {:?}",
                point.x(),
                point.y(),
                hits
            );
        }

        match priority {
            Some(priority) => priority.iter().copied().find(|kind| hits.contains(kind)),
            None => hits.last().copied(),
        }
    }
}

fn grid_line(rows: &[GridRow]) -> LineString<f64> {
    rows.iter()
        .map(|r| Coord {
            x: r.easting,
            y: r.northing,
        })
        .collect()
}

fn read_rows<T>(path: &Path) -> Result<Vec<T>, DredgeError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let rows = reader.deserialize::<T>().collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}
