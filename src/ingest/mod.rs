//! Source readers. Each reader turns one kind of input into [RawActivity] values; nothing here
//! decides what a valid activity is, that belongs to [crate::activity::normalize].

pub mod csv_export;
pub mod export_dir;
pub mod fields;
pub mod fit;
pub mod strava;

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use strava::StravaActivity;

/// Every record shape the readers know how to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum RawActivity {
    /// A row of a Garmin Connect CSV export, keyed by the header as written in the file.
    GarminCsv(CsvRecord),
    /// The session message of a FIT file.
    FitSession(FitSession),
    /// An entry of the Strava athlete activity list.
    Strava(StravaActivity),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvRecord {
    pub file: Arc<str>,
    pub line: u64,
    pub fields: HashMap<String, String>,
}

/// Session totals as recorded by the device. Units are the FIT ones: metres and seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitSession {
    pub file: Arc<str>,
    pub start_time: Option<DateTime<Utc>>,
    pub sport: Option<String>,
    pub total_distance_m: Option<f64>,
    pub total_timer_time_s: Option<f64>,
    pub avg_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub total_calories: Option<f64>,
    pub total_ascent_m: Option<f64>,
}

/// Anything able to hand over recently recorded activities. The pipeline doesn't care whether
/// they come from files on disk or from a remote API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Short name used in logs and user facing output.
    fn name(&self) -> String;

    async fn fetch_recent_activities(&self) -> Result<Vec<RawActivity>>;
}
