use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, TimeDelta};
use tempfile::tempdir;

use dredge_log::{
    archive::day_range_ms,
    classifier::Classifier,
    config::ClassifierConfig,
    database::{Database, ImportOutcome},
    errors::DredgeError,
    ingest::{import_directory, import_file},
    loads::{segment_loads, ActivitySummary},
    models::{Activity, Mmsi, ZoneKind},
    projection::{Crs, LambertConformal},
    zones::ZoneRegistry,
};

const DAY_START_MS: i64 = 1_748_822_400_000; // 2025-06-02T00:00:00Z
const WEEKS: u32 = 368349000;
const OTHER: u32 = 369305000;

const OPEN_WATER: (f64, f64) = (29.45, -94.95);
const DIG: (f64, f64) = (29.50, -94.90);
const DISP: (f64, f64) = (29.55, -94.85);

/// Square in state plane feet around a WGS84 point
fn grid_square(dir: &Path, name: &str, (lat, lon): (f64, f64)) {
    let (e, n) = LambertConformal::texas_south_central().forward(lat, lon);
    let h = 2_000.0;
    let content = format!(
        "E,N\n{},{}\n{},{}\n{},{}\n{},{}\n",
        e - h,
        n - h,
        e + h,
        n - h,
        e + h,
        n + h,
        e - h,
        n + h
    );
    fs::write(dir.join(name), content).unwrap();
}

/// One dredge cycle sampled each minute: sail, dig, sail, discharge, sail, dig
fn cycle() -> Vec<((f64, f64), Option<f64>)> {
    let mut rows = Vec::new();
    let mut push = |position, speed, count| {
        for _ in 0..count {
            rows.push((position, speed));
        }
    };
    push(OPEN_WATER, Some(8.0), 3);
    push(DIG, Some(1.0), 4);
    push(OPEN_WATER, Some(8.0), 3);
    push(DISP, Some(1.0), 4);
    push(OPEN_WATER, Some(8.0), 3);
    push(DIG, Some(1.0), 3);
    push(OPEN_WATER, None, 1);
    rows
}

fn port_file(dir: &Path) {
    let mut content =
        String::from("\"longitude\",\"latitude\",\"MMSI\",\"SPEED\",\"HEADING\",\"COURSE\",\"STATUS\",\"TIMESTAMP\"\n");
    // newest first, the store orders by time
    for (minute, ((lat, lon), speed)) in cycle().into_iter().enumerate().rev() {
        let speed = speed.map(|s| s.to_string()).unwrap_or_default();
        let ts = DAY_START_MS + minute as i64 * 60_000;
        writeln!(content, "{lon},{lat},{WEEKS},{speed},511,90,0,{ts}").unwrap();
        writeln!(content, "{lon},{lat},{OTHER},0.1,511,90,0,{ts}").unwrap();
    }
    // no position
    writeln!(content, ",,{WEEKS},1.0,511,90,0,{}", DAY_START_MS + 30 * 60_000).unwrap();
    // next day
    writeln!(content, "-94.9,29.5,{WEEKS},1.0,511,90,0,{}", DAY_START_MS + 86_400_000).unwrap();
    fs::write(dir.join("weeks_20250602.csv"), content).unwrap();
}

async fn setup_test_db(dir: &Path) -> Database {
    dotenvy::dotenv().ok();
    let url = format!("sqlite://{}", dir.join("dredge_ais.sqlite").display());
    Database::create(&url)
        .await
        .expect("Failed to create database")
}

#[tokio::test]
async fn test_ingest_classify_segment() -> Result<(), DredgeError> {
    let data_dir = tempdir()?;
    let zone_dir = tempdir()?;
    port_file(data_dir.path());
    grid_square(zone_dir.path(), "dig_reach1.csv", DIG);
    grid_square(zone_dir.path(), "disp_pa14.csv", DISP);

    let db = setup_test_db(data_dir.path()).await;
    let outcomes = import_directory(&db, data_dir.path()).await?;
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0].1, ImportOutcome::Loaded { rows: 44, .. }));

    let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
    let (start_ms, end_ms) = day_range_ms(day, day)?;
    let mmsi = Mmsi::try_from(WEEKS)?;
    let track = db.load_track(mmsi, start_ms, end_ms).await?;
    assert_eq!(track.len(), 21);
    assert_eq!(track.reports()[0].timestamp_ms, DAY_START_MS);
    assert_eq!(track.reports()[20].speed_over_ground, None);

    let zones = ZoneRegistry::from_directory(zone_dir.path(), Crs::TexasSouthCentral)?;
    assert_eq!(zones.len(), 2);

    let config = ClassifierConfig::default();
    let classified = Classifier::new(&config, &zones).classify(&track);
    assert_eq!(classified.len(), 21);

    use Activity::{Dig, Disp, Sail};
    let activities: Vec<Activity> = classified.iter().map(|c| c.activity).collect();
    assert_eq!(
        activities,
        vec![
            Sail, Sail, Sail, Sail, Dig, Dig, Sail, Sail, Sail, Sail, Sail, Disp, Disp, Sail,
            Sail, Sail, Sail, Sail, Sail, Dig, Sail,
        ]
    );
    assert_eq!(classified[4].zone, Some(ZoneKind::DigArea));
    assert_eq!(classified[3].zone, Some(ZoneKind::DigArea));
    assert_eq!(classified[11].zone, Some(ZoneKind::DisposalArea));
    assert_eq!(classified[0].zone, None);
    assert_eq!(classified[20].smoothed_speed, Some(1.0));

    let loads = segment_loads(&classified);
    assert_eq!(loads.len(), 2);
    assert_eq!(loads[0].reports, 4..19);
    assert_eq!(loads[1].reports, 19..21);
    assert_eq!(loads[0].time_in(Dig), TimeDelta::minutes(2));
    assert_eq!(loads[0].time_in(Disp), TimeDelta::minutes(2));
    assert_eq!(loads[1].end_ms, DAY_START_MS + 20 * 60_000);

    let summary = ActivitySummary::new(&classified, &loads);
    assert_eq!(summary.loads, 2);
    assert_eq!(summary.time_in(Dig), TimeDelta::minutes(3));
    assert_eq!(summary.time_in_zone(ZoneKind::DigArea), TimeDelta::minutes(7));

    // re-running gives the same labels
    assert_eq!(Classifier::new(&config, &zones).classify(&track), classified);
    Ok(())
}

#[tokio::test]
async fn test_file_imported_once() -> Result<(), DredgeError> {
    let data_dir = tempdir()?;
    port_file(data_dir.path());
    let db = setup_test_db(data_dir.path()).await;

    let path = data_dir.path().join("weeks_20250602.csv");
    let first = import_file(&db, &path).await?;
    assert!(matches!(first, ImportOutcome::Loaded { .. }));
    let second = import_file(&db, &path).await?;
    assert!(matches!(second, ImportOutcome::AlreadyLoaded { .. }));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ais_data")
        .fetch_one(db.pool())
        .await?;
    assert_eq!(rows, 44);
    Ok(())
}

#[tokio::test]
async fn test_missing_store() {
    let dir = tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("missing.sqlite").display());
    let result = Database::from_url(&url).await;
    assert!(matches!(result, Err(DredgeError::NotFound(_))));
}
