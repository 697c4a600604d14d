// Shared helpers for snapsync integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary configs directory with a snapshots root and a source tree
pub struct ConfigDir {
    pub dir: TempDir,
}

impl ConfigDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::create_dir_all(dir.path().join("snapshots")).unwrap();
        fs::create_dir_all(dir.path().join("source")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.dir.path().join("snapshots")
    }

    pub fn source_dir(&self) -> PathBuf {
        self.dir.path().join("source")
    }

    pub fn write(&self, file_name: &str, content: &str) {
        fs::write(self.path().join(file_name), content).unwrap();
    }

    /// Job file with no directory mappings and optional extra lines
    pub fn write_job(&self, file_name: &str, name: &str, extra: &str) {
        self.write(
            file_name,
            &format!(
                "snapshot_name = \"{name}\"\ninterval = \"daily\"\nsnapshots_dir = \"{}\"\nretention = 3\n{extra}\n",
                self.snapshots_dir().display()
            ),
        );
    }
}

pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}
