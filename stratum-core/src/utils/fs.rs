//! Filesystem helpers.

use crate::error::CoreError;
use std::path::Path;

/// Creates `path` and all missing parents.
pub fn ensure_dir_exists(path: &Path) -> Result<(), CoreError> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| CoreError::Filesystem {
        message: "Failed to create directory".to_string(),
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_exists_creates_nested() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a/b/c");
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());
        // Idempotent.
        ensure_dir_exists(&nested).unwrap();
    }
}
