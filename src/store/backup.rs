use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::utils::{
    clock::Clock,
    dir::ensure_dir,
    round::{from_centi_km, round_to},
    time::file_stamp,
};

use super::summary_store::SummaryStore;

pub const BACKUP_PREFIX: &str = "garmin_backup_";

#[derive(Debug, Clone, PartialEq)]
pub struct BackupReport {
    pub path: PathBuf,
    pub total_runs: usize,
    pub total_distance: f64,
}

/// Copies the data file into `backup_dir` under a timestamped name. Returns `None` when there
/// is no data file yet.
pub async fn backup_data_file(
    store: &SummaryStore,
    backup_dir: &Path,
    clock: &dyn Clock,
) -> Result<Option<BackupReport>> {
    if !tokio::fs::try_exists(store.path()).await.unwrap_or(false) {
        info!("Nothing to back up, {:?} doesn't exist", store.path());
        return Ok(None);
    }

    // Only documents that load get backed up.
    let set = store.load().await?;

    ensure_dir(backup_dir).with_context(|| format!("Failed to create {backup_dir:?}"))?;
    let stamp = file_stamp(&clock.time().with_timezone(&Local));
    let path = backup_dir.join(format!("{BACKUP_PREFIX}{stamp}.json"));
    tokio::fs::copy(store.path(), &path)
        .await
        .with_context(|| format!("Failed to copy {:?} to {path:?}", store.path()))?;

    let report = BackupReport {
        path,
        total_runs: set.len(),
        total_distance: round_to(from_centi_km(set.iter().map(|v| v.centi_km()).sum()), 2),
    };
    info!(
        "Backed up {} runs ({} km) to {:?}",
        report.total_runs, report.total_distance, report.path
    );
    Ok(Some(report))
}
