#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use datadepth::schema::{Schema, SchemaBuilder};
use tempfile::{TempDir, tempdir};

/// Absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// The `datadepth` binary with logging quietened.
pub fn datadepth_cmd() -> Command {
    let mut cmd = Command::cargo_bin("datadepth").expect("binary exists");
    cmd.env("RUST_LOG", "error");
    cmd
}

/// Builds a schema from `(header, values)` pairs listed column by column.
pub fn schema_from_columns(columns: &[(&str, Vec<String>)]) -> Schema {
    let header = columns
        .iter()
        .map(|(name, _)| name.to_string())
        .collect::<Vec<_>>();
    let values = columns
        .iter()
        .map(|(_, values)| values.clone())
        .collect::<Vec<_>>();
    SchemaBuilder::default()
        .build(Some(&header), &values)
        .expect("build schema")
}

/// Scratch directory that is removed on drop.
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

    /// Writes `contents` to `name` inside the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.join(name)).expect("read temp file")
    }
}
