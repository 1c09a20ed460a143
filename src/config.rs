//! Application configuration

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::errors::DredgeError;
use crate::models::ZoneKind;
use crate::projection::Crs;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub zones: ZonesConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub vessels: Vec<VesselConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZonesConfig {
    pub directory: PathBuf,
    #[serde(default = "default_source_crs")]
    pub source_crs: Crs,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Width of the centered speed smoothing window
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_window")]
    pub window: Duration,
    #[serde(default = "default_delay_speed")]
    pub delay_speed: f64,
    #[serde(default = "default_work_speed")]
    pub dig_speed: f64,
    #[serde(default = "default_work_speed")]
    pub disp_speed: f64,
    /// Zone kinds a report can be located in
    #[serde(default = "default_location_kinds")]
    pub location_kinds: Vec<ZoneKind>,
    /// Explicit precedence when zones of different kinds overlap
    #[serde(default)]
    pub zone_priority: Option<Vec<ZoneKind>>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ArchiveConfig {
    #[serde(default = "default_archive_url")]
    pub base_url: String,
    #[serde(default = "default_archive_dir")]
    pub storage_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct VesselConfig {
    pub name: String,
    pub mmsi: u32,
}

fn default_source_crs() -> Crs {
    Crs::TexasSouthCentral
}

fn default_window() -> Duration {
    Duration::from_secs(300)
}

fn default_delay_speed() -> f64 {
    0.5
}

fn default_work_speed() -> f64 {
    2.5
}

fn default_location_kinds() -> Vec<ZoneKind> {
    vec![ZoneKind::DigArea, ZoneKind::DisposalArea]
}

fn default_archive_url() -> String {
    "https://coast.noaa.gov/htdata/CMSP/AISDataHandler".to_string()
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("ais_data")
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            delay_speed: default_delay_speed(),
            dig_speed: default_work_speed(),
            disp_speed: default_work_speed(),
            location_kinds: default_location_kinds(),
            zone_priority: None,
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: default_archive_url(),
            storage_dir: default_archive_dir(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("DREDGELOG")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("classifier.location_kinds")
                    .with_list_parse_key("classifier.zone_priority"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> Result<(), DredgeError> {
        if self.database.url.trim().is_empty() {
            return Err(configuration_error("Database url cannot be empty"));
        }
        if self.zones.directory.as_os_str().is_empty() {
            return Err(configuration_error("Zone directory cannot be empty"));
        }
        self.classifier.validate()?;
        validate_vessels(&self.vessels)
    }
}

impl ClassifierConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), DredgeError> {
        self.validate_window()?;
        self.validate_thresholds()?;
        self.validate_locations()?;
        Ok(())
    }

    fn validate_window(&self) -> Result<(), DredgeError> {
        if self.window.as_millis() == 0 {
            return Err(configuration_error("Smoothing window must be greater than zero"));
        }
        Ok(())
    }

    fn validate_thresholds(&self) -> Result<(), DredgeError> {
        for (name, value) in [
            ("delay_speed", self.delay_speed),
            ("dig_speed", self.dig_speed),
            ("disp_speed", self.disp_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(configuration_error(&format!(
                    "Speed threshold {name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    fn validate_locations(&self) -> Result<(), DredgeError> {
        if self.location_kinds.is_empty() {
            return Err(configuration_error("At least one location kind is required"));
        }
        if self.location_kinds.contains(&ZoneKind::TrackOverlay) {
            return Err(configuration_error(
                "Track overlays are display only and cannot be location kinds",
            ));
        }
        if let Some(priority) = &self.zone_priority {
            if let Some(missing) = self
                .location_kinds
                .iter()
                .find(|kind| !priority.contains(kind))
            {
                return Err(configuration_error(&format!(
                    "Zone priority does not rank location kind {missing}"
                )));
            }
        }
        Ok(())
    }
}

fn validate_vessels(vessels: &[VesselConfig]) -> Result<(), DredgeError> {
    let mut names = HashSet::new();
    let mut numbers = HashSet::new();
    for vessel in vessels {
        if vessel.name.trim().is_empty() {
            return Err(configuration_error("Vessel name cannot be empty"));
        }
        if !names.insert(vessel.name.trim().to_uppercase()) {
            return Err(configuration_error(&format!(
                "Duplicate vessel name {}",
                vessel.name
            )));
        }
        if !numbers.insert(vessel.mmsi) {
            return Err(configuration_error(&format!(
                "Duplicate vessel MMSI {}",
                vessel.mmsi
            )));
        }
    }
    Ok(())
}

fn configuration_error(message: &str) -> DredgeError {
    DredgeError::ConfigurationError {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_load_config() {
        env::set_var("DREDGELOG__DATABASE__URL", "sqlite://test.sqlite");
        env::set_var("DREDGELOG__ZONES__DIRECTORY", "/tmp/zones");
        env::set_var("DREDGELOG__ZONES__SOURCE_CRS", "epsg:2278");
        env::set_var("DREDGELOG__CLASSIFIER__WINDOW", "600");
        env::set_var("DREDGELOG__CLASSIFIER__LOCATION_KINDS", "dig-area,disposal-area");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.database.url, "sqlite://test.sqlite");
        assert_eq!(config.zones.directory, PathBuf::from("/tmp/zones"));
        assert_eq!(config.zones.source_crs, Crs::TexasSouthCentral);
        assert_eq!(config.classifier.window, Duration::from_secs(600));
        assert_eq!(config.classifier.delay_speed, 0.5);
        assert_eq!(
            config.classifier.location_kinds,
            vec![ZoneKind::DigArea, ZoneKind::DisposalArea]
        );
        assert_eq!(config.classifier.zone_priority, None);
        assert_eq!(config.archive, ArchiveConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_classifier_defaults_validate() {
        let config = ClassifierConfig::default();
        assert_eq!(config.window, Duration::from_secs(300));
        assert_eq!(config.dig_speed, 2.5);
        assert_eq!(config.disp_speed, 2.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_classifier_invalid_window() {
        let config = ClassifierConfig {
            window: Duration::from_secs(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_classifier_invalid_threshold() {
        let config = ClassifierConfig {
            dig_speed: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClassifierConfig {
            delay_speed: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_classifier_invalid_locations() {
        let config = ClassifierConfig {
            location_kinds: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClassifierConfig {
            location_kinds: vec![ZoneKind::DigArea, ZoneKind::TrackOverlay],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClassifierConfig {
            zone_priority: Some(vec![ZoneKind::DisposalArea]),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClassifierConfig {
            zone_priority: Some(vec![ZoneKind::DisposalArea, ZoneKind::DigArea]),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_vessels() {
        let vessels = vec![
            VesselConfig {
                name: "RB WEEKS".to_string(),
                mmsi: 368349000,
            },
            VesselConfig {
                name: "rb weeks".to_string(),
                mmsi: 369305000,
            },
        ];
        assert!(validate_vessels(&vessels).is_err());

        let vessels = vec![
            VesselConfig {
                name: "RB WEEKS".to_string(),
                mmsi: 368349000,
            },
            VesselConfig {
                name: "MAGDALEN".to_string(),
                mmsi: 368349000,
            },
        ];
        assert!(validate_vessels(&vessels).is_err());
    }
}
