use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{ReleaseType, SemanticVersion};
use crate::error::{ReleaseError, Result};
use crate::files::write_atomically;

pub const DEFAULT_FILE_NAME: &str = "gradle.properties";
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*version\s*=\s*(.+)$").expect("valid version regex"))
}

/// Properties-style file holding the project's `version=` declaration
#[derive(Debug, Clone)]
pub struct ProjectVersionFile {
    path: PathBuf,
}

impl ProjectVersionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProjectVersionFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| {
            ReleaseError::config(format!(
                "Cannot read project version file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Value of the first `version=` line
    pub fn current_version(&self) -> Result<String> {
        let content = self.read()?;
        content
            .lines()
            .find_map(|line| version_regex().captures(line))
            .map(|caps| caps[1].trim().to_string())
            .ok_or_else(|| {
                ReleaseError::config(format!(
                    "No version declaration found in {}",
                    self.path.display()
                ))
            })
    }

    /// Rewrite every `version=` line, keeping the others in place
    pub fn update_version(&self, version: &str) -> Result<()> {
        let content = self.read()?;
        let mut updated = String::with_capacity(content.len());
        for line in content.lines() {
            if version_regex().is_match(line) {
                updated.push_str("version=");
                updated.push_str(version);
            } else {
                updated.push_str(line);
            }
            updated.push('\n');
        }

        tracing::info!(version, file = %self.path.display(), "project version updated");
        write_atomically(&self.path, &updated)
    }

    pub fn remove_snapshot(&self) -> Result<String> {
        let current = self.current_version()?;
        match current.strip_suffix(SNAPSHOT_SUFFIX) {
            Some(release) => {
                self.update_version(release)?;
                Ok(release.to_string())
            }
            None => Ok(current),
        }
    }

    pub fn append_snapshot(&self) -> Result<String> {
        let current = self.current_version()?;
        if current.ends_with(SNAPSHOT_SUFFIX) {
            return Ok(current);
        }
        let snapshot = format!("{}{}", current, SNAPSHOT_SUFFIX);
        self.update_version(&snapshot)?;
        Ok(snapshot)
    }

    /// Bump the patch component, keeping a `-SNAPSHOT` suffix if present
    pub fn increment_patch_version(&self) -> Result<String> {
        let current = self.current_version()?;
        let (base, suffix) = match current.strip_suffix(SNAPSHOT_SUFFIX) {
            Some(base) => (base, SNAPSHOT_SUFFIX),
            None => (current.as_str(), ""),
        };

        let next = format!(
            "{}{}",
            SemanticVersion::parse(base)?.increment(ReleaseType::Patch),
            suffix
        );
        self.update_version(&next)?;
        Ok(next)
    }
}
