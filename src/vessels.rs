//! Vessel identity map between names and MMSI numbers.

use std::collections::HashMap;

use crate::config::VesselConfig;
use crate::errors::DredgeError;
use crate::models::Mmsi;

/// Bidirectional name/MMSI lookup, names are kept upper case as in AIS data
#[derive(Debug, Clone, Default)]
pub struct VesselRegistry {
    by_name: HashMap<String, Mmsi>,
    by_mmsi: HashMap<Mmsi, String>,
}

impl VesselRegistry {
    pub fn new(vessels: &[VesselConfig]) -> Result<Self, DredgeError> {
        let mut registry = Self::default();
        for vessel in vessels {
            let mmsi = Mmsi::try_from(vessel.mmsi)?;
            let name = vessel.name.trim().to_uppercase();
            registry.by_name.insert(name.clone(), mmsi);
            registry.by_mmsi.insert(mmsi, name);
        }
        Ok(registry)
    }

    pub fn mmsi_for(&self, name: &str) -> Option<Mmsi> {
        self.by_name.get(&name.trim().to_uppercase()).copied()
    }

    pub fn name_for(&self, mmsi: Mmsi) -> Option<&str> {
        self.by_mmsi.get(&mmsi).map(String::as_str)
    }

    /// Resolve a vessel given either its name or its MMSI number
    pub fn resolve(&self, vessel: &str) -> Result<Mmsi, DredgeError> {
        if let Some(mmsi) = self.mmsi_for(vessel) {
            return Ok(mmsi);
        }
        Mmsi::try_from(vessel).map_err(|_| DredgeError::UnknownVessel(vessel.to_string()))
    }

    /// Human readable label, falls back to the MMSI number
    pub fn label(&self, mmsi: Mmsi) -> String {
        match self.name_for(mmsi) {
            Some(name) => name.to_string(),
            None => mmsi.to_string(),
        }
    }
}
