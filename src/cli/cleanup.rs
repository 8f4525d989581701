use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::Result;
use tracing::{info, warn};

const CONFIRMATIONS: [&str; 4] = ["y", "yes", "s", "sim"];

/// Asks whether imported export files can be deleted. Anything but an explicit yes keeps them.
pub fn confirm_cleanup(
    files: &[PathBuf],
    mut input: impl BufRead,
    mut output: impl Write,
) -> Result<bool> {
    if files.is_empty() {
        writeln!(output, "No export files to clean up.")?;
        return Ok(false);
    }

    writeln!(output, "Found {} imported export file(s):", files.len())?;
    for file in files {
        writeln!(output, "  {}", file.display())?;
    }
    write!(output, "Delete exported files? (y/N): ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(CONFIRMATIONS.contains(&answer.as_str()))
}

/// Deletes every file it can. Failures are logged per file and don't stop the rest.
pub async fn delete_files(files: &[PathBuf]) -> usize {
    let mut deleted = 0;
    for file in files {
        match tokio::fs::remove_file(file).await {
            Ok(_) => {
                info!("Deleted {file:?}");
                deleted += 1;
            }
            Err(e) => warn!("Failed to delete {file:?}: {e}"),
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, path::PathBuf};

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{confirm_cleanup, delete_files};

    fn answer(files: &[PathBuf], input: &str) -> Result<bool> {
        confirm_cleanup(files, Cursor::new(input.as_bytes()), Vec::new())
    }

    #[test]
    fn accepts_english_and_portuguese_yes() -> Result<()> {
        let files = vec![PathBuf::from("a.csv")];
        for input in ["y\n", "YES\n", " s \n", "Sim\n"] {
            assert!(answer(&files, input)?, "{input:?}");
        }
        for input in ["\n", "n\n", "no\n", "nao\n", ""] {
            assert!(!answer(&files, input)?, "{input:?}");
        }
        Ok(())
    }

    #[test]
    fn no_files_means_no_question() -> Result<()> {
        let mut output = Vec::new();
        let confirmed = confirm_cleanup(&[], Cursor::new(b"y\n".as_slice()), &mut output)?;
        assert!(!confirmed);
        assert!(!String::from_utf8(output)?.contains("Delete"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_files_are_skipped() -> Result<()> {
        let dir = tempdir()?;
        let present = dir.path().join("a.csv");
        std::fs::write(&present, b"")?;
        let files = vec![present.clone(), dir.path().join("gone.csv")];

        assert_eq!(delete_files(&files).await, 1);
        assert!(!present.exists());
        Ok(())
    }
}
