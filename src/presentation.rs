//! Map and table export of zones and classified tracks.

use std::io;

use geo::LineString;
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::DredgeError;
use crate::models::{Activity, ClassifiedReport, ZoneKind};
use crate::zones::{Zone, ZoneGeometry, ZoneRegistry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: &'static str,
}

/// Colors of every zone kind followed by every activity
pub fn legend() -> Vec<LegendEntry> {
    ZoneKind::ALL
        .iter()
        .map(|k| LegendEntry {
            label: k.as_str(),
            color: k.color(),
        })
        .chain(Activity::ALL.iter().map(|a| LegendEntry {
            label: a.as_str(),
            color: a.color(),
        }))
        .collect()
}

fn positions(line: &LineString<f64>) -> Vec<[f64; 2]> {
    line.coords().map(|c| [c.x, c.y]).collect()
}

fn zone_feature(zone: &Zone) -> Value {
    let geometry = match &zone.geometry {
        ZoneGeometry::Line(line) => json!({
            "type": "LineString",
            "coordinates": positions(line),
        }),
        ZoneGeometry::Polygon(polygon) => {
            let rings: Vec<Vec<[f64; 2]>> = std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(positions)
                .collect();
            json!({
                "type": "Polygon",
                "coordinates": rings,
            })
        }
    };

    json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "name": zone.name,
            "kind": zone.kind,
            "color": zone.color(),
            "stations": zone.stations,
        },
    })
}

fn report_feature(c: &ClassifiedReport) -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [c.report.longitude, c.report.latitude],
        },
        "properties": {
            "mmsi": c.report.mmsi,
            "timestamp_ms": c.report.timestamp_ms,
            "speed_over_ground": c.report.speed_over_ground,
            "smoothed_speed": c.smoothed_speed,
            "zone": c.zone,
            "activity": c.activity,
            "color": c.activity.color(),
        },
    })
}

/// Feature collection of the project zones
pub fn zones_geojson(zones: &ZoneRegistry) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": zones.zones().iter().map(zone_feature).collect::<Vec<_>>(),
    })
}

/// Feature collection of zones and a classified track, with the legend
pub fn map_geojson(zones: &ZoneRegistry, vessel: &str, classified: &[ClassifiedReport]) -> Value {
    let features: Vec<Value> = zones
        .zones()
        .iter()
        .map(zone_feature)
        .chain(classified.iter().map(report_feature))
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
        "properties": {
            "vessel": vessel,
            "legend": legend(),
        },
    })
}

#[derive(Debug, Serialize)]
struct CsvRow {
    timestamp_ms: i64,
    time: Option<String>,
    mmsi: u32,
    latitude: f64,
    longitude: f64,
    sog: Option<f64>,
    cog: Option<f64>,
    heading: Option<f64>,
    duration_ms: Option<i64>,
    smoothed_speed: Option<f64>,
    zone: Option<&'static str>,
    activity: &'static str,
}

/// Write a classified track as CSV, one row per report
pub fn write_csv<W: io::Write>(writer: W, classified: &[ClassifiedReport]) -> Result<(), DredgeError> {
    let mut writer = csv::Writer::from_writer(writer);
    for c in classified {
        writer.serialize(CsvRow {
            timestamp_ms: c.report.timestamp_ms,
            time: c.report.time().map(|t| t.to_rfc3339()),
            mmsi: c.report.mmsi.value(),
            latitude: c.report.latitude,
            longitude: c.report.longitude,
            sog: c.report.speed_over_ground,
            cog: c.report.course_over_ground,
            heading: c.report.heading,
            duration_ms: c.duration_ms,
            smoothed_speed: c.smoothed_speed,
            zone: c.zone.map(|z| z.as_str()),
            activity: c.activity.as_str(),
        })?;
    }
    writer.flush()?;
    Ok(())
}
