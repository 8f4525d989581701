use std::path::PathBuf;

use tracing::warn;

use crate::activity::{normalize::DEFAULT_TITLE, summary::DEFAULT_WEEKLY_GOAL_KM};

pub const WEEKLY_GOAL_ENV: &str = "WEEKLY_GOAL_KM";

/// Everything a run needs to know about its surroundings. Built once at startup and passed down.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Where Garmin Connect exports are dropped.
    pub exports_dir: PathBuf,
    /// The summary document read by the website.
    pub data_file: PathBuf,
    pub backup_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Repository the data file is committed to.
    pub repo_dir: PathBuf,
    pub weekly_goal_km: f64,
    pub default_title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exports_dir: PathBuf::from("data/garmin_exports"),
            data_file: PathBuf::from("public/data/garmin_summary.json"),
            backup_dir: PathBuf::from("data/backups"),
            log_dir: PathBuf::from("data/logs"),
            repo_dir: PathBuf::from("."),
            weekly_goal_km: DEFAULT_WEEKLY_GOAL_KM,
            default_title: DEFAULT_TITLE.into(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with environment overrides applied. Invalid values are reported and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(goal) = lookup(WEEKLY_GOAL_ENV) {
            match goal.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v > 0. => config.weekly_goal_km = v,
                _ => warn!("Ignoring {WEEKLY_GOAL_ENV}={goal:?}, expected a positive number"),
            }
        }
        config
    }

    pub fn with_exports_dir(self, exports_dir: Option<PathBuf>) -> Self {
        Self {
            exports_dir: exports_dir.unwrap_or(self.exports_dir),
            ..self
        }
    }

    pub fn with_data_file(self, data_file: Option<PathBuf>) -> Self {
        Self {
            data_file: data_file.unwrap_or(self.data_file),
            ..self
        }
    }

    pub fn with_backup_dir(self, backup_dir: Option<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.unwrap_or(self.backup_dir),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        path::PathBuf,
        sync::{Arc, Mutex},
    };

    use super::{Config, WEEKLY_GOAL_ENV};

    #[test]
    fn defaults_are_the_historical_paths() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.exports_dir, PathBuf::from("data/garmin_exports"));
        assert_eq!(
            config.data_file,
            PathBuf::from("public/data/garmin_summary.json")
        );
        assert_eq!(config.backup_dir, PathBuf::from("data/backups"));
        assert_eq!(config.weekly_goal_km, 25.);
        assert_eq!(config.default_title, "Run");
    }

    #[test]
    fn weekly_goal_from_env() {
        let config = Config::from_lookup(|key| (key == WEEKLY_GOAL_ENV).then(|| "32.5".into()));
        assert_eq!(config.weekly_goal_km, 32.5);

        for invalid in ["", "abc", "-5", "0"] {
            let config = Config::from_lookup(|_| Some(invalid.into()));
            assert_eq!(config.weekly_goal_km, 25., "{invalid:?}");
        }
    }

    #[test]
    fn overrides_replace_only_given_paths() {
        let config = Config::default()
            .with_exports_dir(Some(PathBuf::from("/tmp/exports")))
            .with_data_file(None)
            .with_backup_dir(Some(PathBuf::from("/tmp/backups")));
        assert_eq!(config.exports_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(config.data_file, Config::default().data_file);
        assert_eq!(config.backup_dir, PathBuf::from("/tmp/backups"));
    }

    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn invalid_goal_is_logged() {
        let buffer = Arc::new(Mutex::new(vec![]));
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || Captured(writer.clone()))
            .finish();

        let config = tracing::subscriber::with_default(subscriber, || {
            Config::from_lookup(|_| Some("lots".into()))
        });

        assert_eq!(config.weekly_goal_km, 25.);
        let logged = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("Ignoring WEEKLY_GOAL_KM"), "{logged}");
    }
}
