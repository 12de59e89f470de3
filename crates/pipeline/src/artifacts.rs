//! Transient artifact tracking.
//!
//! Every file the pipeline writes registers here; one finalization pass
//! runs on every exit path and removes whatever was created, logging
//! rather than failing on individual removals.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    paths: Vec<PathBuf>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a path for end-of-request removal. Register before
    /// writing so a failed write cannot leave an untracked file.
    pub fn register(&mut self, path: &Path) {
        debug!(path = %path.display(), "registered artifact");
        self.paths.push(path.to_path_buf());
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Remove every registered artifact. Missing files are fine;
    /// removal errors are logged and skipped.
    pub fn cleanup(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove artifact")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cleanup_removes_all_registered() {
        let dir = tempdir().unwrap();
        let mut registry = ArtifactRegistry::new();

        let mut paths = Vec::new();
        for name in ["a.tif", "b.tif", "c.tif"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"data").unwrap();
            registry.register(&path);
            paths.push(path);
        }

        registry.cleanup();
        for path in &paths {
            assert!(!path.exists());
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_file_written_after_registration_is_removed() {
        // Callers register the path first, then write, so a write that
        // fails partway still leaves its debris tracked
        let dir = tempdir().unwrap();
        let mut registry = ArtifactRegistry::new();
        let path = dir.path().join("partial.tif");
        registry.register(&path);
        std::fs::write(&path, b"half-written").unwrap();

        registry.cleanup();
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_tolerates_missing_files() {
        let dir = tempdir().unwrap();
        let mut registry = ArtifactRegistry::new();
        registry.register(&dir.path().join("never-written.tif"));
        registry.cleanup();
        assert!(registry.is_empty());
    }
}
