// File: engine/tests/common/fixtures/test_tree.rs
use engine::{DirectoryMapping, SnapshotConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const NAME: &str = "home";
pub const INTERVAL: &str = "daily";

/// Temporary source tree plus an empty snapshots root
pub struct TestTree {
    pub dir: TempDir,
}

impl TestTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("source/alice")).unwrap();
        fs::create_dir_all(dir.path().join("snapshots")).unwrap();
        Self { dir }
    }

    pub fn source(&self) -> PathBuf {
        self.dir.path().join("source/alice")
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("snapshots")
    }

    pub fn write_source(&self, relative: &str, content: &str) {
        let path = self.source().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn config(&self, retention: u32) -> SnapshotConfig {
        let mut config = SnapshotConfig::new(NAME, INTERVAL, self.root(), retention);
        config
            .dirs
            .push(DirectoryMapping::new(self.source(), "home/alice"));
        config
    }

    pub fn generation(&self, number: u32) -> PathBuf {
        self.root().join(format!("{NAME}.{INTERVAL}.{number}"))
    }

    /// Create generation `number` by hand, with a marker file naming it
    pub fn seed_generation(&self, number: u32) {
        let dir = self.generation(number).join("home/alice");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("marker"), number.to_string()).unwrap();
    }

    /// Generation numbers present under the root for this job, sorted
    pub fn generation_numbers(&self) -> Vec<u32> {
        let prefix = format!("{NAME}.{INTERVAL}.");
        let mut numbers: Vec<u32> = fs::read_dir(self.root())
            .unwrap()
            .filter_map(|entry| {
                let name = entry.unwrap().file_name().into_string().unwrap();
                name.strip_prefix(&prefix)?.parse().ok()
            })
            .collect();
        numbers.sort();
        numbers
    }

    pub fn scratch_dirs(&self) -> Vec<PathBuf> {
        fs::read_dir(self.root())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| file_name(path).starts_with("tmp"))
            .collect()
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}
