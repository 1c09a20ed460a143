//! Dredge activity logging from AIS position reports

pub mod archive;
pub mod classifier;
pub mod config;
pub mod database;
pub mod errors;
pub mod ingest;
pub mod loads;
pub mod models;
pub mod presentation;
pub mod projection;
pub mod smoothing;
pub mod vessels;
pub mod zones;
