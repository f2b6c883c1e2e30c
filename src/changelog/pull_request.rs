//! Pull request link lookup for released changelog entries.

use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use std::collections::HashSet;

/// A merged pull request as reported by a hosting service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub id: u64,
    pub link: String,
}

/// Hosting service client (GitHub, Bitbucket, ...)
pub trait PullRequestClient {
    /// Most recently merged pull request of `project/repository`
    fn latest_merged_pull_request(
        &self,
        project: &str,
        repository: &str,
    ) -> Result<Option<PullRequest>>;

    /// Commit ids included in the pull request
    fn pull_request_commits(&self, project: &str, repository: &str, id: u64)
        -> Result<Vec<String>>;
}

/// Supplies the link written into the released changelog entry
pub trait PullRequestLinkSource {
    fn release_pull_request_link(&self) -> Option<String>;
}

/// A link known up front, or none at all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedPullRequestLink(pub Option<String>);

impl PullRequestLinkSource for FixedPullRequestLink {
    fn release_pull_request_link(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Project and repository names taken from a remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    pub project: String,
    pub repository: String,
}

impl RemoteLocation {
    /// Parse `https://host/project/repo.git`, `ssh://git@host:7999/project/repo.git`
    /// or `git@host:project/repo.git`
    pub fn parse(url: &str) -> Result<Self> {
        let path = match url.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map(|(_, path)| path),
            None => url.split_once(':').map(|(_, path)| path),
        }
        .ok_or_else(|| ReleaseError::pull_request(format!("Unsupported remote url: {}", url)))?;

        let mut segments = path.split('/').filter(|segment| !segment.is_empty());
        match (segments.next(), segments.next()) {
            (Some(project), Some(repository)) => Ok(RemoteLocation {
                project: project.to_string(),
                repository: repository.trim_end_matches(".git").to_string(),
            }),
            _ => Err(ReleaseError::pull_request(format!(
                "Remote url has no project/repository path: {}",
                url
            ))),
        }
    }
}

/// Looks up the pull request merged since the last release
///
/// The latest merged pull request is accepted only when all of its commits
/// belong to the history since the last tag. Lookup failures never abort the
/// release: they are logged and the entry is written without a link.
pub struct PullRequestLinkProvider<'a, R: Repository, C: PullRequestClient> {
    repo: &'a R,
    client: C,
    remote: String,
}

impl<'a, R: Repository, C: PullRequestClient> PullRequestLinkProvider<'a, R, C> {
    pub fn new(repo: &'a R, client: C, remote: impl Into<String>) -> Self {
        PullRequestLinkProvider {
            repo,
            client,
            remote: remote.into(),
        }
    }

    fn lookup(&self) -> Result<Option<String>> {
        let url = self.repo.remote_url(&self.remote)?;
        let location = RemoteLocation::parse(&url)?;

        let Some(pull_request) = self
            .client
            .latest_merged_pull_request(&location.project, &location.repository)?
        else {
            return Ok(None);
        };

        let released: HashSet<String> = self
            .repo
            .commits_since_last_tag()?
            .into_iter()
            .map(|commit| commit.id)
            .collect();
        let unknown: Vec<String> = self
            .client
            .pull_request_commits(&location.project, &location.repository, pull_request.id)?
            .into_iter()
            .filter(|id| !released.contains(id))
            .collect();

        if !unknown.is_empty() {
            tracing::warn!(
                pull_request = pull_request.id,
                commits = ?unknown,
                "unknown pull request commits"
            );
            return Ok(None);
        }

        Ok(Some(pull_request.link))
    }
}

impl<R: Repository, C: PullRequestClient> PullRequestLinkSource
    for PullRequestLinkProvider<'_, R, C>
{
    fn release_pull_request_link(&self) -> Option<String> {
        match self.lookup() {
            Ok(link) => link,
            Err(e) => {
                tracing::warn!(error = %e, "can't get pull request link");
                None
            }
        }
    }
}
