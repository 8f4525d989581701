//! Keeps the training page of a personal running site up to date.
//! Garmin Connect exports (CSV or FIT) or the Strava API go in, a single JSON summary with
//! totals, weekly progress and the full run history comes out.
//!

pub mod activity;
pub mod cli;
pub mod config;
pub mod fs;
pub mod ingest;
pub mod publish;
pub mod store;
pub mod utils;
