//! Publishing of the updated data to the website repository.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::process::Command;
use tracing::{debug, info};

use crate::utils::time::iso_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    NothingToPublish,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Records `paths` under `message` and sends them upstream.
    async fn commit_and_push(&self, paths: &[PathBuf], message: &str) -> Result<PublishOutcome>;
}

pub fn commit_message(date: NaiveDate, total_runs: usize, total_distance: f64) -> String {
    format!(
        "feat: update training data - {} ({total_runs} runs, {total_distance}km)",
        iso_date(date)
    )
}

/// Publishes through the `git` executable found on `PATH`.
pub struct GitPublisher {
    repo_dir: PathBuf,
}

impl GitPublisher {
    pub fn new(repo_dir: PathBuf) -> Self {
        Self { repo_dir }
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .await
            .context("Failed to run git, is it installed?")?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("{path:?} is not valid UTF-8"))
}

#[async_trait]
impl Publisher for GitPublisher {
    async fn commit_and_push(&self, paths: &[PathBuf], message: &str) -> Result<PublishOutcome> {
        let status = self.git(&["status", "--porcelain"]).await?;
        if status.trim().is_empty() {
            info!("No changes to commit");
            return Ok(PublishOutcome::NothingToPublish);
        }

        for path in paths {
            self.git(&["add", path_arg(path)?]).await?;
        }
        self.git(&["commit", "-m", message]).await?;
        info!("Created commit: {message}");
        self.git(&["push"]).await?;
        info!("Pushed to remote");
        Ok(PublishOutcome::Published)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::commit_message;

    #[test]
    fn commit_message_carries_totals() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        assert_eq!(
            commit_message(date, 42, 321.5),
            "feat: update training data - 2024-06-12 (42 runs, 321.5km)"
        );
    }
}
