//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the git operations a
//! release needs, allowing for a real repository implementation and a mock
//! implementation for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [Repository] trait. The concrete
//! implementations include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation for testing
//!
//! # Usage
//!
//! Release phases depend on the [Repository] trait rather than concrete
//! implementations.
//!
//! ```rust
//! # use artifact_release::git::{CommitFiles, Repository};
//! # fn example<R: Repository>(repo: &R) -> artifact_release::Result<()> {
//! if !repo.has_uncommitted_changes()? {
//!     repo.commit("release 1.2.3", &CommitFiles::default())?;
//!     repo.create_tag("1.2.3")?;
//!     repo.push("origin")?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use std::path::PathBuf;

/// Commit information used to validate pull requests
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The full commit hash
    pub id: String,
    /// The commit message
    pub message: String,
}

/// Files a release commit picks up besides already tracked modifications
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitFiles {
    /// Files added whenever they exist (changelog, version file)
    pub always: Vec<PathBuf>,
    /// Regexes matched against untracked paths relative to the work tree
    pub allowed_untracked: Vec<String>,
}

/// Common git operation trait for abstraction
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// underlying errors (like `git2::Error`) to [crate::error::ReleaseError]
/// variants; push failures are reported as `ReleaseError::Remote`.
pub trait Repository: Send {
    /// Paths with staged or unstaged changes to tracked files
    fn uncommitted_changes(&self) -> Result<Vec<String>>;

    /// Whether any tracked file differs from HEAD
    fn has_uncommitted_changes(&self) -> Result<bool> {
        Ok(!self.uncommitted_changes()?.is_empty())
    }

    /// Commit all tracked modifications plus the given files
    ///
    /// # Arguments
    /// * `message` - Commit message
    /// * `files` - Extra files to add before committing
    fn commit(&self, message: &str, files: &CommitFiles) -> Result<()>;

    /// Commit without changes, used to check push permissions
    fn commit_empty(&self, message: &str) -> Result<()>;

    /// Create a tag pointing at HEAD
    fn create_tag(&self, name: &str) -> Result<()>;

    /// Check whether `refs/tags/<name>` exists
    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Push the current branch and all tags
    fn push(&self, remote: &str) -> Result<()>;

    /// Push only the current branch
    fn push_branch(&self, remote: &str) -> Result<()>;

    /// Commits reachable from HEAD that are newer than the closest tag
    ///
    /// Returns every commit reachable from HEAD when no tag is found.
    fn commits_since_last_tag(&self) -> Result<Vec<CommitInfo>>;

    /// Name of the checked out branch, or the HEAD commit id when detached
    fn current_branch_name(&self) -> Result<String>;

    /// URL configured for `remote`
    fn remote_url(&self, remote: &str) -> Result<String>;
}
