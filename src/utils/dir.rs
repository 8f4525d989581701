use std::{io, path::Path};

/// Creates a directory and all of its parents. An already existing directory is fine.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    match std::fs::create_dir_all(path) {
        Ok(_) => Ok(()),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(v) => Err(v),
    }
}

/// Parent directory of a file path. Relative file names live in the current directory.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{ensure_dir, parent_dir};

    #[test]
    fn ensure_dir_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let nested = dir.path().join("public/data");
        ensure_dir(&nested)?;
        ensure_dir(&nested)?;
        assert!(nested.is_dir());
        Ok(())
    }

    #[test]
    fn parent_of_bare_file_is_current_dir() {
        assert_eq!(parent_dir(Path::new("summary.json")), Path::new("."));
        assert_eq!(
            parent_dir(Path::new("public/data/summary.json")),
            Path::new("public/data")
        );
    }
}
