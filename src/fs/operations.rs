use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use tokio::{fs::File, io::AsyncWriteExt};
use tracing::debug;

use crate::utils::dir::parent_dir;

/// Replaces the contents of `path` as a whole. Data is written into a sibling temporary file
/// that is then renamed over the target, so readers observe either the old or the new file and
/// never a partial one.
pub async fn replace_file(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    let temp_path = temp_sibling(path);

    let write = async {
        let mut file = File::create(&temp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        Ok::<_, std::io::Error>(())
    };
    if let Err(e) = write.await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }
    debug!("Replaced {path:?} ({} bytes)", contents.len());
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    parent_dir(path).join(name)
}

/// Regular files directly inside `dir` whose extension matches one of `extensions`
/// (case-insensitive), ordered by file name.
pub async fn list_files_with_extensions(
    dir: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = vec![];
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|v| v.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::{list_files_with_extensions, replace_file};

    #[tokio::test]
    async fn replace_file_overwrites_whole_contents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("summary.json");

        replace_file(&path, b"a much longer first version").await?;
        replace_file(&path, b"short").await?;

        assert_eq!(tokio::fs::read_to_string(&path).await?, "short");
        let leftovers = std::fs::read_dir(dir.path())?.count();
        assert_eq!(leftovers, 1);
        Ok(())
    }

    #[tokio::test]
    async fn replace_file_fails_without_parent_dir() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("missing/summary.json");
        assert!(replace_file(&path, b"{}").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn listing_filters_and_sorts_by_name() -> Result<()> {
        let dir = tempdir()?;
        for name in ["b.csv", "a.FIT", "notes.txt", "c.csv"] {
            std::fs::write(dir.path().join(name), b"")?;
        }
        std::fs::create_dir(dir.path().join("nested.csv"))?;

        let files = list_files_with_extensions(dir.path(), &["csv", "fit"]).await?;
        let names = files
            .iter()
            .filter_map(|v| v.file_name()?.to_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.FIT", "b.csv", "c.csv"]);
        Ok(())
    }
}
