use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use serde::Deserialize;
use tokio::{fs::File, io::AsyncReadExt};
use tracing::{debug, info, warn};

use crate::{
    activity::{normalize::DEFAULT_TITLE, ActivitySet, Summary},
    fs::operations::replace_file,
    utils::dir::{ensure_dir, parent_dir},
};

use super::{
    error::{Result, StoreError},
    legacy::StoredActivity,
};

/// The parts of a summary document needed to rebuild the activity set. Everything else in the
/// file is derived and gets recomputed.
#[derive(Deserialize)]
struct StoredDocument {
    #[serde(default)]
    activities: Option<Vec<StoredActivity>>,
    /// Documents written before the full list was stored only kept the latest runs.
    #[serde(default)]
    recent_runs: Option<Vec<StoredActivity>>,
}

/// Persists the summary document at a fixed path.
pub struct SummaryStore {
    path: PathBuf,
    /// Title given to stored activities that predate titles.
    legacy_title: String,
}

impl SummaryStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            legacy_title: DEFAULT_TITLE.into(),
        }
    }

    pub fn with_legacy_title(self, legacy_title: impl Into<String>) -> Self {
        Self {
            legacy_title: legacy_title.into(),
            ..self
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted activities. A missing file is an empty set, a file that isn't a
    /// summary document is an error.
    pub async fn load(&self) -> Result<ActivitySet> {
        let contents = match self.read_shared().await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No data file at {:?}, starting empty", self.path);
                return Ok(ActivitySet::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.iter().all(u8::is_ascii_whitespace) {
            warn!("Data file {:?} is empty, starting empty", self.path);
            return Ok(ActivitySet::default());
        }

        let document: StoredDocument =
            serde_json::from_slice(&contents).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        let stored = match (document.activities, document.recent_runs) {
            (Some(activities), _) => activities,
            (None, Some(recent)) => {
                warn!(
                    "{:?} has no activity list, loading {} runs from recent_runs",
                    self.path,
                    recent.len()
                );
                recent
            }
            (None, None) => vec![],
        };
        let stored_count = stored.len();
        let activities = stored
            .into_iter()
            .filter_map(|v| v.into_activity(&self.legacy_title))
            .collect::<ActivitySet>();
        if activities.len() < stored_count {
            warn!(
                "Dropped {} unusable stored activities from {:?}",
                stored_count - activities.len(),
                self.path
            );
        }
        debug!("Loaded {} activities from {:?}", activities.len(), self.path);
        Ok(activities)
    }

    async fn read_shared(&self) -> std::io::Result<Vec<u8>> {
        let mut file = File::open(&self.path).await?;
        file.lock_shared()?;
        let mut contents = vec![];
        let read = file.read_to_end(&mut contents).await;
        file.unlock_async().await?;
        read?;
        Ok(contents)
    }

    /// Writes the whole document, replacing the previous one in a single rename.
    pub async fn save(&self, summary: &Summary) -> Result<()> {
        let dir = parent_dir(&self.path);
        ensure_dir(dir).map_err(|source| StoreError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let contents = serde_json::to_vec_pretty(summary).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: std::io::Error::other(e),
        })?;
        replace_file(&self.path, &contents)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        info!(
            "Saved {} activities to {:?}",
            summary.activities.len(),
            self.path
        );
        Ok(())
    }
}
