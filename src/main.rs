//! Dredge activity logging utility

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use dredge_log::archive::{day_range_ms, days, Archive};
use dredge_log::classifier::Classifier;
use dredge_log::config::AppConfig;
use dredge_log::database::{Database, ImportOutcome};
use dredge_log::errors::DredgeError;
use dredge_log::ingest::import_directory;
use dredge_log::loads::{segment_loads, ActivitySummary};
use dredge_log::models::{Activity, ClassifiedReport, ZoneKind};
use dredge_log::presentation::{map_geojson, write_csv, zones_geojson};
use dredge_log::vessels::VesselRegistry;
use dredge_log::zones::ZoneRegistry;

#[derive(Debug, Parser)]
#[command(version, about = "Classify dredge activity from AIS position reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import every Port Houston CSV export of a directory
    Ingest { dir: PathBuf },
    /// Classify the track of a vessel and log a summary
    Classify {
        #[command(flatten)]
        query: TrackQuery,
        /// Write the classified track as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write zones and a classified track as GeoJSON
    Render {
        #[command(flatten)]
        query: TrackQuery,
        #[arg(long)]
        output: PathBuf,
    },
    /// Write the project zones alone as GeoJSON
    Zones {
        #[arg(long)]
        output: PathBuf,
    },
    /// List the daily archive files of a date range
    Archive {
        #[command(flatten)]
        range: DateRange,
    },
}

#[derive(Debug, Args)]
struct DateRange {
    /// First day, YYYY-MM-DD
    #[arg(long)]
    start: NaiveDate,
    /// Last day, inclusive
    #[arg(long)]
    end: NaiveDate,
}

#[derive(Debug, Args)]
struct TrackQuery {
    /// Vessel name or MMSI
    #[arg(long)]
    vessel: String,
    #[command(flatten)]
    range: DateRange,
}

#[tokio::main]
async fn main() -> Result<(), DredgeError> {
    #[cfg(feature = "dotenvy")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load()?;
    config.validate()?;

    match cli.command {
        Command::Ingest { dir } => ingest(&config, &dir).await,
        Command::Classify { query, output } => {
            let (_zones, label, classified) = classify(&config, &query).await?;
            summarize(&label, &classified);
            if let Some(path) = output {
                write_csv(BufWriter::new(File::create(&path)?), &classified)?;
                info!("Wrote {} classified reports to {}", classified.len(), path.display());
            }
            Ok(())
        }
        Command::Render { query, output } => {
            let (zones, label, classified) = classify(&config, &query).await?;
            let map = map_geojson(&zones, &label, &classified);
            serde_json::to_writer(BufWriter::new(File::create(&output)?), &map)?;
            info!("Wrote map of {label} to {}", output.display());
            Ok(())
        }
        Command::Zones { output } => {
            let zones =
                ZoneRegistry::from_directory(&config.zones.directory, config.zones.source_crs)?;
            serde_json::to_writer(BufWriter::new(File::create(&output)?), &zones_geojson(&zones))?;
            info!("Wrote {} zones to {}", zones.len(), output.display());
            Ok(())
        }
        Command::Archive { range } => {
            let archive = Archive::new(config.archive.clone());
            for day in days(range.start, range.end)? {
                if archive.cached(day) {
                    info!("{day}: cached at {}", archive.storage_path(day).display());
                } else {
                    info!("{day}: fetch {}", archive.url(day));
                }
            }
            Ok(())
        }
    }
}

async fn ingest(config: &AppConfig, dir: &Path) -> Result<(), DredgeError> {
    let db = Database::create(&config.database.url).await?;
    db.store_vessels(&config.vessels).await?;

    let outcomes = import_directory(&db, dir).await?;
    let loaded = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, ImportOutcome::Loaded { .. }))
        .count();
    info!(
        "Imported {loaded} new files, {} already loaded",
        outcomes.len() - loaded
    );
    Ok(())
}

/// Load and classify the track of the queried vessel
async fn classify(
    config: &AppConfig,
    query: &TrackQuery,
) -> Result<(ZoneRegistry, String, Vec<ClassifiedReport>), DredgeError> {
    let vessels = VesselRegistry::new(&config.vessels)?;
    let mmsi = vessels.resolve(&query.vessel)?;
    let (start_ms, end_ms) = day_range_ms(query.range.start, query.range.end)?;

    let zones = ZoneRegistry::from_directory(&config.zones.directory, config.zones.source_crs)?;
    if zones.is_empty() {
        warn!("No zones loaded, every report will be classified as sail or delay");
    }

    let db = Database::from_url(&config.database.url).await?;
    let label = match db.vessel_name(mmsi).await? {
        Some(name) => name,
        None => vessels.label(mmsi),
    };
    let track = db.load_track(mmsi, start_ms, end_ms).await?;

    let classified = Classifier::new(&config.classifier, &zones).classify(&track);
    Ok((zones, label, classified))
}

fn summarize(label: &str, classified: &[ClassifiedReport]) {
    let loads = segment_loads(classified);
    let summary = ActivitySummary::new(classified, &loads);

    info!(
        "{label}: {} reports, {} loads",
        summary.reports, summary.loads
    );
    for activity in Activity::ALL {
        info!("{label}: {activity} {}", summary.time_in(activity));
    }
    for zone in [ZoneKind::DigArea, ZoneKind::DisposalArea] {
        info!("{label}: in {zone} {}", summary.time_in_zone(zone));
    }
    for load in &loads {
        info!(
            "{label}: load {} from {:?}, {} reports, lasting {}, digging {}",
            load.number,
            load.start(),
            load.reports.len(),
            load.duration(),
            load.time_in(Activity::Dig)
        );
    }
}
