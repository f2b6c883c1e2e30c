//! Changelog driven releases.
//!
//! - `document` - parsing and rewriting of the changelog text
//! - `pull_request` - best-effort lookup of the release pull request link
//! - This module - [ChangelogManager], the file-backed entry point

pub mod document;
pub mod pull_request;

pub use document::{
    prepend_next_version_markers, ChangelogDocument, ReleaseEntry, ReleaseReadiness,
    BREAKING_CHANGES_MARKER, DESCRIPTION_BEGIN_MARKER, DESCRIPTION_END_MARKER,
    NEXT_VERSION_TYPE_MARKER, RELEASE_DATE_FORMAT,
};
pub use pull_request::{
    FixedPullRequestLink, PullRequest, PullRequestClient, PullRequestLinkProvider,
    PullRequestLinkSource, RemoteLocation,
};

use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::SemanticVersion;
use crate::error::Result;
use crate::files::write_atomically;

/// Default changelog file name
pub const DEFAULT_FILE_NAME: &str = "CHANGELOG.md";

/// Reads and rewrites the changelog file.
///
/// Every call reads the whole file; mutations compute the new text in memory
/// and replace the file in one step, so a failure leaves it untouched.
#[derive(Debug, Clone)]
pub struct ChangelogManager {
    path: PathBuf,
}

impl ChangelogManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ChangelogManager { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the current file content
    pub fn read(&self) -> Result<ChangelogDocument> {
        let content = fs::read_to_string(&self.path)?;
        Ok(ChangelogDocument::parse(&content))
    }

    pub fn readiness(&self) -> Result<ReleaseReadiness> {
        Ok(self.read()?.readiness())
    }

    pub fn has_next_version_info(&self) -> Result<bool> {
        Ok(self.read()?.has_next_version_info())
    }

    pub fn has_breaking_changes_marker(&self) -> Result<bool> {
        Ok(self.read()?.has_breaking_changes_marker())
    }

    pub fn is_major_version(&self) -> Result<bool> {
        Ok(self.read()?.is_major_version())
    }

    /// Version the changelog would be released as, without touching the file
    pub fn next_version(&self) -> Result<Option<SemanticVersion>> {
        self.read()?.next_version()
    }

    /// Rotate the pending block into a released entry dated today
    pub fn update_to_next_version(&self, pull_request_link: Option<&str>) -> Result<ReleaseEntry> {
        self.update_to_next_version_on(pull_request_link, Local::now().date_naive())
    }

    /// Rotate the pending block into a released entry dated `date`
    pub fn update_to_next_version_on(
        &self,
        pull_request_link: Option<&str>,
        date: NaiveDate,
    ) -> Result<ReleaseEntry> {
        let (rotated, entry) = self.read()?.rotate(pull_request_link, date)?;
        write_atomically(&self.path, &rotated.render())?;
        tracing::info!(
            path = %self.path.display(),
            version = %entry.version,
            "changelog rotated"
        );
        Ok(entry)
    }

    /// Prepend empty marker placeholders for the next cycle.
    ///
    /// Not idempotent: call once per release cycle.
    pub fn append_next_version_description_markers(&self) -> Result<()> {
        let content = prepend_next_version_markers(&fs::read_to_string(&self.path)?);
        write_atomically(&self.path, &content)?;
        tracing::info!(path = %self.path.display(), "next version markers added");
        Ok(())
    }
}
