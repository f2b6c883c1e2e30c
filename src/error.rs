use std::fmt;

use thiserror::Error;

/// Why a changelog cannot be released yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// Nothing between the description markers, or the end marker is missing
    MissingDescription,
    /// No `### NEXT_VERSION_TYPE=MAJOR|MINOR|PATCH` line with a concrete type
    MissingReleaseType,
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotReadyReason::MissingDescription => {
                write!(f, "changelog doesn't have new version description")
            }
            NotReadyReason::MissingReleaseType => {
                write!(f, "changelog doesn't have new version type")
            }
        }
    }
}

/// Unified error type for artifact-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Release state error: {0}")]
    State(String),

    #[error("Changelog is not ready for release: {0}")]
    NotReady(NotReadyReason),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Pull request lookup failed: {0}")]
    PullRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in artifact-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a release state error with context
    pub fn state(msg: impl Into<String>) -> Self {
        ReleaseError::State(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Create a pull request lookup error with context
    pub fn pull_request(msg: impl Into<String>) -> Self {
        ReleaseError::PullRequest(msg.into())
    }
}
