use std::fmt;

/// Non-fatal conditions met while running a release phase.
/// These are reported to the user and the phase continues.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// The project has no changelog and the changelog is optional
    ChangelogAbsent { path: String },
    /// The released changelog entry is written without a pull request link
    PullRequestLinkUnavailable,
    /// The changelog exists but does not name the next release type
    NoReleaseType { path: String },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::ChangelogAbsent { path } => {
                write!(f, "Changelog '{}' is absent, skipping changelog steps", path)
            }
            ReleaseWarning::PullRequestLinkUnavailable => {
                write!(f, "Pull request link is unavailable, entry is released without it")
            }
            ReleaseWarning::NoReleaseType { path } => {
                write!(
                    f,
                    "Changelog '{}' has no release type, using the project version",
                    path
                )
            }
        }
    }
}
