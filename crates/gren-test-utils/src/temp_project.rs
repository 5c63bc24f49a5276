//! Temporary project directories for integration tests.

use gren_cache::ProjectPaths;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A throwaway project rooted in a temp directory, deleted on drop.
#[derive(Debug)]
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    /// An empty project directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    /// The project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// `.gren/` and store paths for this project.
    #[must_use]
    pub fn paths(&self) -> ProjectPaths {
        ProjectPaths::new(self.root())
    }

    /// Write (or overwrite) a file, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write file");
        path
    }

    /// Bump a file's modification time by a full second without changing
    /// its content. A coarse step keeps the change visible to stores that
    /// record millisecond timestamps.
    pub fn touch(&self, rel: &str) {
        let path = self.root().join(rel);
        let file = std::fs::File::options()
            .append(true)
            .open(&path)
            .expect("open for touch");
        let modified = file
            .metadata()
            .and_then(|meta| meta.modified())
            .expect("read mtime");
        file.set_modified(modified + Duration::from_secs(1))
            .expect("set mtime");
    }

    /// Read a file back.
    #[must_use]
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root().join(rel)).expect("read file")
    }

    /// Does a path exist under the project root?
    #[must_use]
    pub fn exists(&self, rel: &str) -> bool {
        self.root().join(rel).exists()
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}
