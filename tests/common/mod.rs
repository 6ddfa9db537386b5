#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{TempDir, tempdir};

pub const PEOPLE_CSV: &str = "id,name,created_at\n1,Alice,2024-01-01 12:00:00\n2,Bob,\n";

/// Scratch directory that is removed when the test finishes.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` under the workspace and returns the full path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.join(name)).expect("read output file")
    }
}

pub fn csv_sqlgen() -> Command {
    let mut cmd = Command::cargo_bin("csv-sqlgen").expect("binary exists");
    cmd.env_remove("RUST_LOG");
    cmd
}
