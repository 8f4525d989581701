use std::{
    io::{BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    activity::{merge, ActivitySet, Aggregator, Normalizer},
    config::Config,
    ingest::{export_dir::ExportDirectory, ActivitySource, RawActivity},
    publish::{commit_message, PublishOutcome, Publisher},
    store::{
        backup::{backup_data_file, BackupReport},
        SummaryStore,
    },
    utils::clock::Clock,
};

use super::cleanup::{confirm_cleanup, delete_files};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Merge into the persisted set.
    Incremental,
    /// Replace the persisted set with whatever the source provides.
    Rebuild,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub records: usize,
    pub skipped: usize,
    pub admitted: usize,
    pub duplicates: usize,
    pub total_runs: usize,
    pub total_distance: f64,
    /// Whether the data file was rewritten.
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub backup: Option<BackupReport>,
    pub import: ImportReport,
    pub published: bool,
    pub deleted_exports: usize,
}

/// One load, merge, summarize, save cycle against the configured data file.
pub struct Pipeline {
    store: SummaryStore,
    normalizer: Normalizer,
    aggregator: Aggregator,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: SummaryStore::new(config.data_file.clone())
                .with_legacy_title(config.default_title.clone()),
            normalizer: Normalizer::new(clock.clone())
                .with_default_title(config.default_title.clone()),
            aggregator: Aggregator::new(config.weekly_goal_km),
            clock,
        }
    }

    pub fn store(&self) -> &SummaryStore {
        &self.store
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub async fn import(
        &self,
        source: &dyn ActivitySource,
        mode: ImportMode,
    ) -> Result<ImportReport> {
        // Loading first makes a corrupt data file fail the run before anything is fetched.
        let existing = self.existing(mode).await?;
        info!(
            "Importing from {} into {} existing runs",
            source.name(),
            existing.len()
        );
        let records = source.fetch_recent_activities().await?;
        self.merge_and_save(existing, &records, mode).await
    }

    async fn existing(&self, mode: ImportMode) -> Result<ActivitySet> {
        Ok(match mode {
            ImportMode::Incremental => self.store.load().await?,
            ImportMode::Rebuild => ActivitySet::default(),
        })
    }

    async fn merge_and_save(
        &self,
        existing: ActivitySet,
        records: &[RawActivity],
        mode: ImportMode,
    ) -> Result<ImportReport> {
        let normalized = self.normalizer.normalize_all(records);
        let (merged, merge_report) = merge(existing, normalized.activities);

        let mut report = ImportReport {
            records: records.len(),
            skipped: normalized.skipped,
            admitted: merge_report.admitted,
            duplicates: merge_report.duplicates,
            total_runs: merged.len(),
            ..Default::default()
        };
        info!(
            "{} records: {} new, {} duplicates, {} skipped",
            report.records, report.admitted, report.duplicates, report.skipped
        );

        match mode {
            ImportMode::Incremental if report.admitted == 0 => {
                info!("No new activities, data file left as is");
                return Ok(report);
            }
            ImportMode::Rebuild if merged.is_empty() => {
                warn!("No activities found, refusing to replace the data file with an empty one");
                return Ok(report);
            }
            _ => {}
        }

        let summary = self.aggregator.summarize(merged, self.clock.as_ref());
        self.store.save(&summary).await?;
        report.total_runs = summary.stats.total_runs;
        report.total_distance = summary.stats.total_distance;
        report.saved = true;
        Ok(report)
    }

    /// Backup, import from the export directory, publish, then offer to delete the imported
    /// exports. Stops after the import when nothing new was found.
    pub async fn update(
        &self,
        exports: &ExportDirectory,
        publisher: &dyn Publisher,
        backup_dir: PathBuf,
        input: impl BufRead,
        mut output: impl Write,
    ) -> Result<UpdateReport> {
        info!("Step 1: backup");
        let backup = backup_data_file(&self.store, &backup_dir, self.clock()).await?;
        match &backup {
            Some(v) => writeln!(
                output,
                "Backup created: {} ({} runs, {}km)",
                v.path.display(),
                v.total_runs,
                v.total_distance
            )?,
            None => writeln!(output, "No data file yet, a new one will be created")?,
        }

        info!("Step 2: import");
        let existing = self.existing(ImportMode::Incremental).await?;
        info!(
            "Importing from {} into {} existing runs",
            exports.name(),
            existing.len()
        );
        let batch = exports.read_exports().await?;
        let import = self
            .merge_and_save(existing, &batch.records, ImportMode::Incremental)
            .await?;
        writeln!(
            output,
            "Imported {} new runs ({} duplicates, {} skipped)",
            import.admitted, import.duplicates, import.skipped
        )?;

        let mut report = UpdateReport {
            backup,
            import,
            published: false,
            deleted_exports: 0,
        };
        if !report.import.saved {
            writeln!(output, "Nothing new to import, stopping here")?;
            return Ok(report);
        }

        info!("Step 3: publish");
        let message = commit_message(
            self.clock.local_date(),
            report.import.total_runs,
            report.import.total_distance,
        );
        // git rejects pathspecs that match nothing, a first run has no backup directory.
        let paths = [self.store.path().to_path_buf(), backup_dir]
            .into_iter()
            .filter(|v| v.exists())
            .collect::<Vec<_>>();
        match publisher.commit_and_push(&paths, &message).await {
            Ok(PublishOutcome::Published) => report.published = true,
            Ok(PublishOutcome::NothingToPublish) => {}
            Err(e) => warn!("Publishing failed, commit manually: {e:#}"),
        }

        info!("Step 4: cleanup");
        if confirm_cleanup(&batch.files, input, &mut output)? {
            report.deleted_exports = delete_files(&batch.files).await;
        }

        writeln!(output)?;
        writeln!(
            output,
            "Backup: {}",
            if report.backup.is_some() { "yes" } else { "n/a (new file)" }
        )?;
        writeln!(output, "Imported: {} runs", report.import.admitted)?;
        writeln!(
            output,
            "Published: {}",
            if report.published { "yes" } else { "manual commit needed" }
        )?;
        Ok(report)
    }
}
