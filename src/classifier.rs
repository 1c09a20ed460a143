//! Activity classification of a dredge track.
//!
//! Every report is labelled in priority order, the first matching rule wins:
//!
//! 1. `delay`: smoothed speed at or below the delay threshold, in any zone
//! 2. `dig`: inside a dig area at or below the dig threshold
//! 3. `disp`: inside a disposal area at or below the discharge threshold
//! 4. `sail`: everything else
//!
//! Speed is smoothed with a centered time window over the native sampling,
//! see [`centered_rolling_mean`].

use geo::{Coord, Point};
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::models::{Activity, ClassifiedReport, Track, ZoneKind};
use crate::projection::WORKING_CRS;
use crate::smoothing::centered_rolling_mean;
use crate::zones::ZoneRegistry;

/// Classifier for one project, shared read only between runs
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    config: &'a ClassifierConfig,
    zones: &'a ZoneRegistry,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a ClassifierConfig, zones: &'a ZoneRegistry) -> Self {
        Self { config, zones }
    }

    /// Classify every report of the track, output is in track order.
    pub fn classify(&self, track: &Track) -> Vec<ClassifiedReport> {
        let reports = track.reports();
        if reports.is_empty() {
            return Vec::new();
        }

        let timestamps: Vec<i64> = reports.iter().map(|r| r.timestamp_ms).collect();
        let speeds: Vec<Option<f64>> = reports.iter().map(|r| r.speed_over_ground).collect();
        let smoothed = centered_rolling_mean(&timestamps, &speeds, self.config.window);

        let classified: Vec<ClassifiedReport> = reports
            .iter()
            .zip(smoothed)
            .enumerate()
            .map(|(i, (report, smoothed_speed))| {
                let zone = self.locate(report.longitude, report.latitude);
                ClassifiedReport {
                    report: report.clone(),
                    duration_ms: i
                        .checked_sub(1)
                        .map(|p| report.timestamp_ms.saturating_sub(timestamps[p])),
                    smoothed_speed,
                    zone,
                    activity: self.activity(smoothed_speed, zone),
                }
            })
            .collect();

        if tracing::enabled!(tracing::Level::DEBUG) {
            for activity in Activity::ALL {
                let count = classified.iter().filter(|c| c.activity == activity).count();
                debug!("Classified {count} of {} reports as {activity}", classified.len());
            }
        }

        classified
    }

    /// Location zone kind of a WGS84 position
    pub fn locate(&self, longitude: f64, latitude: f64) -> Option<ZoneKind> {
        let position = WORKING_CRS.from_wgs84(Coord {
            x: longitude,
            y: latitude,
        });
        self.zones.locate(
            &Point::from(position),
            &self.config.location_kinds,
            self.config.zone_priority.as_deref(),
        )
    }

    /// Resolve the activity of a report from its smoothed speed and zone.
    ///
    /// Without a smoothed speed no threshold can match and the report is `sail`.
    pub fn activity(&self, smoothed_speed: Option<f64>, zone: Option<ZoneKind>) -> Activity {
        let Some(speed) = smoothed_speed else {
            return Activity::Sail;
        };

        if speed <= self.config.delay_speed {
            return Activity::Delay;
        }

        match zone {
            Some(ZoneKind::DigArea) if speed <= self.config.dig_speed => Activity::Dig,
            Some(ZoneKind::DisposalArea) if speed <= self.config.disp_speed => Activity::Disp,
            _ => Activity::Sail,
        }
    }
}
