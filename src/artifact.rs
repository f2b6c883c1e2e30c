//! Artifact version resolution.
//!
//! The version stamped on the artifact being built comes from the first
//! source that yields one:
//!
//! 1. the version stored by an in-flight release, returned verbatim;
//! 2. the next version computed from the changelog markers;
//! 3. the project version declaration without its `-SNAPSHOT` suffix.
//!
//! Versions from steps 2 and 3 get a branch suffix on non-release branches.

use std::fmt;

use crate::changelog::ChangelogManager;
use crate::domain::BranchPolicy;
use crate::error::Result;
use crate::git::Repository;
use crate::properties::{ProjectVersionFile, SNAPSHOT_SUFFIX};
use crate::release_info::ReleaseInfoStore;

/// Where a resolved artifact version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    ReleaseInfo,
    Changelog,
    ProjectVersion,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSource::ReleaseInfo => write!(f, "release info storage"),
            VersionSource::Changelog => write!(f, "changelog"),
            VersionSource::ProjectVersion => write!(f, "project version"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: String,
    pub source: VersionSource,
}

pub struct ReleaseVersionResolver<'a, R: Repository> {
    store: &'a ReleaseInfoStore,
    changelog: &'a ChangelogManager,
    version_file: &'a ProjectVersionFile,
    policy: &'a BranchPolicy,
    repo: &'a R,
}

impl<'a, R: Repository> ReleaseVersionResolver<'a, R> {
    pub fn new(
        store: &'a ReleaseInfoStore,
        changelog: &'a ChangelogManager,
        version_file: &'a ProjectVersionFile,
        policy: &'a BranchPolicy,
        repo: &'a R,
    ) -> Self {
        ReleaseVersionResolver {
            store,
            changelog,
            version_file,
            policy,
            repo,
        }
    }

    /// Version of the artifact built right now
    pub fn resolve_artifact_version(&self) -> Result<ResolvedVersion> {
        if let Some(version) = self.store.load_version()? {
            tracing::info!(%version, "Artifact version from release info storage");
            return Ok(ResolvedVersion {
                version,
                source: VersionSource::ReleaseInfo,
            });
        }

        // A rotated changelog has no release type until the next change is described
        if self.changelog.exists() {
            if let Some(next) = self.changelog.next_version()? {
                let version = self.with_branch_suffix(&next.to_string())?;
                tracing::info!(%version, "Artifact version from changelog");
                return Ok(ResolvedVersion {
                    version,
                    source: VersionSource::Changelog,
                });
            }
        }

        let declared = self.version_file.current_version()?;
        let base = declared.strip_suffix(SNAPSHOT_SUFFIX).unwrap_or(&declared);
        let version = self.with_branch_suffix(base)?;
        tracing::info!(%version, "Artifact version from project version");
        Ok(ResolvedVersion {
            version,
            source: VersionSource::ProjectVersion,
        })
    }

    fn with_branch_suffix(&self, version: &str) -> Result<String> {
        let branch = self.repo.current_branch_name()?;
        Ok(self.policy.artifact_version(version, &branch))
    }
}
