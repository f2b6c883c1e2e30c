//! Release phase orchestration
//!
//! Each phase of the release cycle is one method of [ReleaseWorkflow] and one
//! subcommand of the binary. Phases run as separate processes in this order:
//!
//! 1. `check-changelog` - the changelog describes the next version
//! 2. `rotate` - release the changelog entry, set the project version
//! 3. `check-release` - the tag is free and the remote accepts pushes
//! 4. `pre-release` - commit the release and tag it
//! 5. `check-pre-release-executed` - guard before publishing
//! 6. `release` - bump to the next snapshot and push
//!
//! The rotate phase stores the release version through [ReleaseInfoStore];
//! later phases read it from there.

use std::path::Path;

use crate::artifact::{ReleaseVersionResolver, ResolvedVersion, VersionSource};
use crate::boundary::ReleaseWarning;
use crate::changelog::{
    ChangelogManager, PullRequestLinkSource, ReleaseReadiness, DESCRIPTION_BEGIN_MARKER,
    DESCRIPTION_END_MARKER, NEXT_VERSION_TYPE_MARKER,
};
use crate::config::ReleaseConfig;
use crate::domain::{BranchPolicy, SemanticVersion};
use crate::error::{ReleaseError, Result};
use crate::git::{CommitFiles, Repository};
use crate::properties::ProjectVersionFile;
use crate::release_info::ReleaseInfoStore;

/// Prefix of every commit created by a release
pub const COMMIT_PREFIX: &str = "[Artifact Release]";

/// Result of a release phase
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutcome {
    /// One-line description of what the phase did
    pub summary: String,
    /// Non-fatal conditions met on the way
    pub warnings: Vec<ReleaseWarning>,
}

impl PhaseOutcome {
    fn new(summary: impl Into<String>) -> Self {
        PhaseOutcome {
            summary: summary.into(),
            warnings: Vec::new(),
        }
    }

    fn with_warning(mut self, warning: ReleaseWarning) -> Self {
        self.warnings.push(warning);
        self
    }
}

/// Result of the rotate phase
#[derive(Debug, Clone, PartialEq)]
pub struct RotateOutcome {
    /// Version stored for the release
    pub version: String,
    /// Last released changelog version
    pub previous_version: Option<SemanticVersion>,
    /// Released changelog entry, when the project has a changelog
    pub description: Option<String>,
    pub warnings: Vec<ReleaseWarning>,
}

/// Result of the artifact version query
#[derive(Debug, Clone, PartialEq)]
pub struct VersionOutcome {
    pub resolved: ResolvedVersion,
    pub warnings: Vec<ReleaseWarning>,
}

/// Runs release phases against one project checkout
pub struct ReleaseWorkflow<'a, R: Repository> {
    repo: &'a R,
    config: &'a ReleaseConfig,
    changelog: ChangelogManager,
    version_file: ProjectVersionFile,
    store: ReleaseInfoStore,
}

impl<'a, R: Repository> ReleaseWorkflow<'a, R> {
    /// Create a workflow for the project rooted at `project_dir`
    pub fn new(repo: &'a R, config: &'a ReleaseConfig, project_dir: &Path) -> Self {
        ReleaseWorkflow {
            repo,
            config,
            changelog: ChangelogManager::new(config.changelog_path(project_dir)),
            version_file: ProjectVersionFile::new(config.version_file_path(project_dir)),
            store: ReleaseInfoStore::new(config.build_dir_path(project_dir)),
        }
    }

    pub fn changelog(&self) -> &ChangelogManager {
        &self.changelog
    }

    pub fn version_file(&self) -> &ProjectVersionFile {
        &self.version_file
    }

    pub fn store(&self) -> &ReleaseInfoStore {
        &self.store
    }

    fn changelog_name(&self) -> String {
        self.changelog.path().display().to_string()
    }

    fn commit_files(&self) -> CommitFiles {
        CommitFiles {
            always: vec![
                self.changelog.path().to_path_buf(),
                self.version_file.path().to_path_buf(),
            ],
            allowed_untracked: self.config.git.allowed_files_to_commit.clone(),
        }
    }

    fn stored_version(&self) -> Result<String> {
        self.store
            .load_version()?
            .ok_or_else(|| ReleaseError::state("Next release version is absent"))
    }

    /// Check that the changelog describes the next version
    pub fn check_changelog(&self) -> Result<PhaseOutcome> {
        if !self.changelog.exists() {
            tracing::info!(path = %self.changelog_name(), "changelog is absent");
            if self.config.changelog_required {
                return Err(ReleaseError::config(format!(
                    "Create the changelog file {}",
                    self.changelog_name()
                )));
            }
            return Ok(PhaseOutcome::new("Changelog check skipped").with_warning(
                ReleaseWarning::ChangelogAbsent {
                    path: self.changelog_name(),
                },
            ));
        }

        let release_type = match self.changelog.readiness()? {
            ReleaseReadiness::Ready { release_type, .. } => release_type,
            ReleaseReadiness::NotReady(reason) => {
                return Err(ReleaseError::state(format!(
                    "{}: {}. Describe the next version between {} and {}, choose the release type in {}",
                    self.changelog_name(),
                    reason,
                    DESCRIPTION_BEGIN_MARKER,
                    DESCRIPTION_END_MARKER,
                    NEXT_VERSION_TYPE_MARKER
                )));
            }
        };

        if self.changelog.is_major_version()? && !self.changelog.has_breaking_changes_marker()? {
            return Err(ReleaseError::state(format!(
                "A major release requires a note in {} between {} and {} in the form \
                 \"**breaking changes** what changed\", including how to migrate to the new version",
                self.changelog_name(),
                DESCRIPTION_BEGIN_MARKER,
                DESCRIPTION_END_MARKER
            )));
        }

        Ok(PhaseOutcome::new(format!(
            "Changelog describes the next {} release",
            release_type
        )))
    }

    /// Release the pending changelog entry and store the release version
    ///
    /// Without a changelog the release version is the project version
    /// without its `-SNAPSHOT` suffix.
    pub fn rotate(&self, links: &dyn PullRequestLinkSource) -> Result<RotateOutcome> {
        let uncommitted = self.repo.uncommitted_changes()?;
        if !uncommitted.is_empty() {
            return Err(ReleaseError::state(format!(
                "There are uncommitted changes\n{}",
                uncommitted.join("\n")
            )));
        }

        tracing::info!(
            current_version = ?self.version_file.current_version().ok(),
            "Start pre release"
        );

        let mut warnings = Vec::new();
        let (version, previous_version, description) = if self.changelog.exists() {
            let previous_version = self.changelog.read()?.last_version()?;

            let link = if self.config.add_pull_request_link {
                let link = links.release_pull_request_link();
                if link.is_none() {
                    warnings.push(ReleaseWarning::PullRequestLinkUnavailable);
                }
                link
            } else {
                None
            };

            let entry = self.changelog.update_to_next_version(link.as_deref())?;
            let version = entry.version.to_string();
            self.version_file.update_version(&version)?;
            self.store.store_changelog(&entry.description_md)?;
            (version, previous_version, Some(entry.description_md))
        } else {
            tracing::info!(path = %self.changelog_name(), "Changelog rotate skipped, file not found");
            warnings.push(ReleaseWarning::ChangelogAbsent {
                path: self.changelog_name(),
            });
            (self.version_file.remove_snapshot()?, None, None)
        };

        tracing::info!(release_version = %version, "Update project version");
        self.store.store_version(&version)?;

        Ok(RotateOutcome {
            version,
            previous_version,
            description,
            warnings,
        })
    }

    /// Fail if the release tag exists or the remote rejects pushes
    pub fn check_release(&self) -> Result<PhaseOutcome> {
        let version = self.stored_version()?;
        if self.repo.tag_exists(&version)? {
            return Err(ReleaseError::state(format!(
                "Tag '{}' already exists",
                version
            )));
        }

        self.repo
            .commit_empty(&format!("{} Check push", COMMIT_PREFIX))?;
        self.repo
            .push_branch(&self.config.git.remote)
            .map_err(|e| {
                ReleaseError::remote(format!(
                    "Push unsuccessful, check your repository permission settings: {}",
                    e
                ))
            })?;

        Ok(PhaseOutcome::new(format!(
            "Release {} can be tagged and pushed",
            version
        )))
    }

    /// Commit the release changes and tag them with the release version
    pub fn pre_release(&self) -> Result<PhaseOutcome> {
        let version = self.stored_version()?;
        self.repo.commit(
            &format!("{} - pre tag commit: '{}'.", COMMIT_PREFIX, version),
            &self.commit_files(),
        )?;
        self.repo.create_tag(&version)?;

        Ok(PhaseOutcome::new(format!("Tagged release {}", version)))
    }

    pub fn check_pre_release_executed(&self) -> Result<PhaseOutcome> {
        let version = self.stored_version()?;
        Ok(PhaseOutcome::new(format!(
            "Pre-release of {} was executed",
            version
        )))
    }

    /// Move to the next snapshot version and push the release
    pub fn release(&self) -> Result<PhaseOutcome> {
        self.version_file.increment_patch_version()?;
        let next_version = self.version_file.append_snapshot()?;

        let mut outcome = PhaseOutcome::new(format!("Next development version is {}", next_version));
        if self.changelog.exists() {
            self.changelog.append_next_version_description_markers()?;
        } else {
            outcome = outcome.with_warning(ReleaseWarning::ChangelogAbsent {
                path: self.changelog_name(),
            });
        }

        self.repo.commit(
            &format!("{} - new version commit: '{}'.", COMMIT_PREFIX, next_version),
            &self.commit_files(),
        )?;
        self.repo.push(&self.config.git.remote)?;

        Ok(outcome)
    }

    /// Version of the artifact built right now
    pub fn artifact_version(&self) -> Result<VersionOutcome> {
        let policy = BranchPolicy::from(&self.config.branches);
        let resolved = ReleaseVersionResolver::new(
            &self.store,
            &self.changelog,
            &self.version_file,
            &policy,
            self.repo,
        )
        .resolve_artifact_version()?;

        let mut warnings = Vec::new();
        if resolved.source == VersionSource::ProjectVersion && self.changelog.exists() {
            warnings.push(ReleaseWarning::NoReleaseType {
                path: self.changelog_name(),
            });
        }

        Ok(VersionOutcome { resolved, warnings })
    }

    /// Forget the stored release state
    pub fn clean(&self) -> Result<PhaseOutcome> {
        self.store.clear()?;
        Ok(PhaseOutcome::new(format!(
            "Removed {}",
            self.store.release_dir().display()
        )))
    }
}
