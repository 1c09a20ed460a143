//! Dredge loads and time spent per activity.
//!
//! A load starts when the dredge begins digging after sailing and lasts until
//! the next load starts, so one load spans dig, sail, discharge and the trip
//! back. Loads are a view over a classified track, reports are not modified.

use std::collections::HashMap;
use std::ops::Range;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::models::{Activity, ClassifiedReport, ZoneKind};

/// One dredge load, `reports` indexes the classified track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Load {
    /// Zero based load number within the track
    pub number: usize,
    pub reports: Range<usize>,
    pub start_ms: i64,
    /// Start of the next load, or the last report of the track
    pub end_ms: i64,
    /// Milliseconds spent per activity within the load
    pub durations_ms: HashMap<Activity, i64>,
}

impl Load {
    pub fn start(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start_ms)
    }

    pub fn duration(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.end_ms - self.start_ms)
    }

    pub fn time_in(&self, activity: Activity) -> TimeDelta {
        TimeDelta::milliseconds(self.durations_ms.get(&activity).copied().unwrap_or(0))
    }
}

/// Split a classified track into loads.
///
/// A run of `dig` reports opens a new load when the last activity before it,
/// ignoring delays, is `sail`. Waiting at the dig area after sailing back still
/// starts a new load, while dig runs broken up by delays stay within the same
/// load. The first dig run of a track opens a load whatever came before it,
/// since the track may begin in the middle of a cycle.
pub fn segment_loads(classified: &[ClassifiedReport]) -> Vec<Load> {
    let mut starts = Vec::new();
    let mut previous: Option<Activity> = None;
    for (i, c) in classified.iter().enumerate() {
        match c.activity {
            Activity::Delay => continue,
            Activity::Dig => {
                let opens = match previous {
                    Some(Activity::Sail) => true,
                    Some(Activity::Dig) => false,
                    _ => starts.is_empty(),
                };
                if opens {
                    starts.push(i);
                }
            }
            _ => {}
        }
        previous = Some(c.activity);
    }

    let Some(last) = classified.last() else {
        return Vec::new();
    };

    starts
        .iter()
        .enumerate()
        .map(|(number, &start)| {
            let end = starts.get(number + 1).copied().unwrap_or(classified.len());
            let end_ms = classified
                .get(end)
                .map_or(last.report.timestamp_ms, |c| c.report.timestamp_ms);
            Load {
                number,
                reports: start..end,
                start_ms: classified[start].report.timestamp_ms,
                end_ms,
                durations_ms: durations_by(&classified[start..end], |c| Some(c.activity)),
            }
        })
        .collect()
}

/// Sum the time since the previous report per key
fn durations_by<K, F>(classified: &[ClassifiedReport], key: F) -> HashMap<K, i64>
where
    K: std::hash::Hash + Eq,
    F: Fn(&ClassifiedReport) -> Option<K>,
{
    let mut totals = HashMap::new();
    for c in classified {
        if let (Some(k), Some(duration)) = (key(c), c.duration_ms) {
            *totals.entry(k).or_insert(0) += duration;
        }
    }
    totals
}

/// Time spent per activity and per zone over a classified track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub reports: usize,
    pub loads: usize,
    pub activity_ms: HashMap<Activity, i64>,
    pub zone_ms: HashMap<ZoneKind, i64>,
}

impl ActivitySummary {
    pub fn new(classified: &[ClassifiedReport], loads: &[Load]) -> Self {
        Self {
            reports: classified.len(),
            loads: loads.len(),
            activity_ms: durations_by(classified, |c| Some(c.activity)),
            zone_ms: durations_by(classified, |c| c.zone),
        }
    }

    pub fn time_in(&self, activity: Activity) -> TimeDelta {
        TimeDelta::milliseconds(self.activity_ms.get(&activity).copied().unwrap_or(0))
    }

    pub fn time_in_zone(&self, zone: ZoneKind) -> TimeDelta {
        TimeDelta::milliseconds(self.zone_ms.get(&zone).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mmsi, PositionReport};

    fn classified(minute: i64, activity: Activity, zone: Option<ZoneKind>) -> ClassifiedReport {
        ClassifiedReport {
            report: PositionReport {
                timestamp_ms: minute * 60_000,
                latitude: 29.5,
                longitude: -94.9,
                speed_over_ground: Some(1.0),
                course_over_ground: None,
                heading: None,
                mmsi: Mmsi::try_from(368349000u32).unwrap(),
            },
            duration_ms: None,
            smoothed_speed: Some(1.0),
            zone,
            activity,
        }
    }

    fn track(activities: &[Activity]) -> Vec<ClassifiedReport> {
        let mut out: Vec<ClassifiedReport> = activities
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let zone = match a {
                    Activity::Dig => Some(ZoneKind::DigArea),
                    Activity::Disp => Some(ZoneKind::DisposalArea),
                    _ => None,
                };
                classified(i as i64, *a, zone)
            })
            .collect();
        for i in 1..out.len() {
            out[i].duration_ms = Some(out[i].report.timestamp_ms - out[i - 1].report.timestamp_ms);
        }
        out
    }

    use Activity::{Delay, Dig, Disp, Sail};

    #[test]
    fn no_reports_no_loads() {
        assert!(segment_loads(&[]).is_empty());
        assert!(segment_loads(&track(&[Sail, Disp, Delay])).is_empty());
    }

    #[test]
    fn loads_start_at_dig_after_sail() {
        let t = track(&[Sail, Dig, Dig, Sail, Disp, Sail, Dig, Sail, Disp, Sail]);
        let loads = segment_loads(&t);

        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0].reports, 1..6);
        assert_eq!(loads[1].reports, 6..10);
        assert_eq!(loads[0].start_ms, 60_000);
        assert_eq!(loads[0].end_ms, 6 * 60_000);
        // last load ends at the last report
        assert_eq!(loads[1].end_ms, 9 * 60_000);
        assert_eq!(loads[0].duration(), TimeDelta::minutes(5));
        assert_eq!(loads[0].time_in(Dig), TimeDelta::minutes(2));
        assert_eq!(loads[0].time_in(Disp), TimeDelta::minutes(1));
        assert_eq!(loads[0].time_in(Sail), TimeDelta::minutes(2));
    }

    #[test]
    fn delay_inside_dig_keeps_load() {
        let t = track(&[Sail, Dig, Delay, Dig, Sail, Disp, Sail]);
        let loads = segment_loads(&t);
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].reports, 1..7);
        assert_eq!(loads[0].time_in(Delay), TimeDelta::minutes(1));
    }

    #[test]
    fn delay_before_dig_after_sail_opens_load() {
        let t = track(&[Sail, Dig, Dig, Sail, Disp, Sail, Delay, Dig, Dig, Sail]);
        let loads = segment_loads(&t);
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0].reports, 1..7);
        // the wait at the dig area belongs to the new load
        assert_eq!(loads[1].reports, 7..10);
        assert_eq!(loads[0].time_in(Delay), TimeDelta::minutes(1));
        assert_eq!(loads[1].time_in(Dig), TimeDelta::minutes(2));
    }

    #[test]
    fn track_starting_in_dig_opens_load() {
        let t = track(&[Dig, Dig, Sail, Disp, Sail, Dig]);
        let loads = segment_loads(&t);
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0].reports, 0..5);
        assert_eq!(loads[1].reports, 5..6);
        assert_eq!(loads[1].start_ms, loads[1].end_ms);
    }

    #[test]
    fn first_dig_after_delay_opens_load() {
        let t = track(&[Delay, Dig, Sail, Dig]);
        let loads = segment_loads(&t);
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0].reports, 1..3);
    }

    #[test]
    fn summary_totals() {
        let t = track(&[Sail, Dig, Dig, Delay, Sail, Disp, Sail]);
        let loads = segment_loads(&t);
        let summary = ActivitySummary::new(&t, &loads);

        assert_eq!(summary.reports, 7);
        assert_eq!(summary.loads, 1);
        assert_eq!(summary.time_in(Dig), TimeDelta::minutes(2));
        assert_eq!(summary.time_in(Delay), TimeDelta::minutes(1));
        assert_eq!(summary.time_in(Sail), TimeDelta::minutes(2));
        assert_eq!(summary.time_in(Disp), TimeDelta::minutes(1));
        assert_eq!(summary.time_in_zone(ZoneKind::DigArea), TimeDelta::minutes(2));
        assert_eq!(summary.time_in_zone(ZoneKind::DisposalArea), TimeDelta::minutes(1));
        assert_eq!(summary.time_in_zone(ZoneKind::Centerline), TimeDelta::zero());
    }
}
