//! Release state handed from the rotate phase to later phases.
//!
//! Two plain-text files live under `<build_dir>/release/`: the resolved
//! version and the released changelog excerpt. A missing file means no
//! release is in progress.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::files::write_atomically;

pub const RELEASE_DIR: &str = "release";
pub const RELEASE_VERSION_FILE: &str = "release-version.txt";
pub const RELEASE_CHANGELOG_FILE: &str = "release-changelog.md";

/// File-backed store for the in-flight release, rooted at the build output directory
#[derive(Debug, Clone)]
pub struct ReleaseInfoStore {
    build_dir: PathBuf,
}

impl ReleaseInfoStore {
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        ReleaseInfoStore {
            build_dir: build_dir.into(),
        }
    }

    pub fn release_dir(&self) -> PathBuf {
        self.build_dir.join(RELEASE_DIR)
    }

    pub fn version_path(&self) -> PathBuf {
        self.release_dir().join(RELEASE_VERSION_FILE)
    }

    pub fn changelog_path(&self) -> PathBuf {
        self.release_dir().join(RELEASE_CHANGELOG_FILE)
    }

    pub fn store_version(&self, version: &str) -> Result<()> {
        tracing::debug!(version, "storing release version");
        write_atomically(&self.version_path(), version)
    }

    pub fn store_changelog(&self, description_md: &str) -> Result<()> {
        write_atomically(&self.changelog_path(), description_md)
    }

    /// Stored version with surrounding whitespace removed
    pub fn load_version(&self) -> Result<Option<String>> {
        Ok(read_if_exists(&self.version_path())?.map(|v| v.trim().to_string()))
    }

    pub fn load_changelog(&self) -> Result<Option<String>> {
        read_if_exists(&self.changelog_path())
    }

    /// Remove all stored release state
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(self.release_dir()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
