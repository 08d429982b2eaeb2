use crate::error::DataError;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes `bytes` to `path` atomically.
///
/// The data goes to a sibling temp file which is fsynced and then renamed
/// over the target, so readers see either the old file or the new one.
///
/// # Errors
///
/// Returns `DataError::Io` if any step fails. The temp file is removed on a
/// failed rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DataError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;

    let temp_path = temp_path_for(path);
    {
        let mut file = File::create(&temp_path).map_err(|e| DataError::io(&temp_path, e))?;
        file.write_all(bytes)
            .map_err(|e| DataError::io(&temp_path, e))?;
        file.sync_all().map_err(|e| DataError::io(&temp_path, e))?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(DataError::io(path, e));
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parent_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("table.csv");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_failed_rename_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory at the target path makes the rename fail
        let path = dir.path().join("table.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "old").unwrap();

        assert!(write_atomic(&path, b"new").is_err());
        assert_eq!(fs::read_to_string(path.join("keep")).unwrap(), "old");
        assert!(!temp_path_for(&path).exists());
    }
}
