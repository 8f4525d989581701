use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::{fs::operations::list_files_with_extensions, utils::dir::ensure_dir};

use super::{csv_export::read_csv_export, fit::read_fit_file, ActivitySource, RawActivity};

const EXPORT_EXTENSIONS: [&str; 2] = ["csv", "fit"];

/// Records read from the export directory, with the files they came from.
#[derive(Debug, Default)]
pub struct ExportBatch {
    pub records: Vec<RawActivity>,
    /// Files that were read, in name order. Files that failed to read are not listed.
    pub files: Vec<PathBuf>,
}

/// The directory where Garmin Connect exports are dropped by hand.
pub struct ExportDirectory {
    dir: PathBuf,
}

impl ExportDirectory {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Export files currently present, ordered by file name. Creates the directory when it
    /// doesn't exist yet so the user knows where to put files.
    pub async fn export_files(&self) -> Result<Vec<PathBuf>> {
        ensure_dir(&self.dir).with_context(|| format!("Failed to create {:?}", self.dir))?;
        list_files_with_extensions(&self.dir, &EXPORT_EXTENSIONS)
            .await
            .with_context(|| format!("Failed to list {:?}", self.dir))
    }

    /// Reads every export file. A file that can't be read is warned about and left out of the
    /// batch, both its records and its path.
    pub async fn read_exports(&self) -> Result<ExportBatch> {
        let files = self.export_files().await?;
        if files.is_empty() {
            info!("No export files found in {:?}", self.dir);
        }

        let mut batch = ExportBatch::default();
        for file in files {
            match read_export_file(&file).await {
                Ok(mut v) => {
                    info!("Read {} records from {file:?}", v.len());
                    batch.records.append(&mut v);
                    batch.files.push(file);
                }
                Err(e) => warn!("Skipping {file:?}: {e:#}"),
            }
        }
        Ok(batch)
    }
}

async fn read_export_file(path: &Path) -> Result<Vec<RawActivity>> {
    let is_fit = path
        .extension()
        .and_then(|v| v.to_str())
        .is_some_and(|v| v.eq_ignore_ascii_case("fit"));
    if is_fit {
        read_fit_file(path).await
    } else {
        read_csv_export(path).await
    }
}

#[async_trait]
impl ActivitySource for ExportDirectory {
    fn name(&self) -> String {
        format!("export directory {:?}", self.dir)
    }

    async fn fetch_recent_activities(&self) -> Result<Vec<RawActivity>> {
        Ok(self.read_exports().await?.records)
    }
}
