use crate::error::{ReleaseError, Result};
use crate::git::{CommitFiles, CommitInfo, Repository};
use std::sync::{Mutex, MutexGuard};

/// A commit recorded by [MockRepository]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommit {
    pub message: String,
    pub files: CommitFiles,
    pub empty: bool,
}

#[derive(Debug, Default)]
struct MockState {
    commits: Vec<RecordedCommit>,
    tags: Vec<String>,
    pushes: Vec<String>,
}

/// Mock repository for testing without actual git operations
pub struct MockRepository {
    branch: String,
    remote_url: Option<String>,
    uncommitted: Vec<String>,
    commits_since_last_tag: Vec<CommitInfo>,
    fail_push: bool,
    state: Mutex<MockState>,
}

impl MockRepository {
    /// Create a clean mock repository on `master`
    pub fn new() -> Self {
        MockRepository {
            branch: "master".to_string(),
            remote_url: None,
            uncommitted: Vec::new(),
            commits_since_last_tag: Vec::new(),
            fail_push: false,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Mark a tracked file as modified
    pub fn with_uncommitted(mut self, path: impl Into<String>) -> Self {
        self.uncommitted.push(path.into());
        self
    }

    /// Add a commit to the history since the last tag
    pub fn with_commit(mut self, id: impl Into<String>, message: impl Into<String>) -> Self {
        self.commits_since_last_tag.push(CommitInfo {
            id: id.into(),
            message: message.into(),
        });
        self
    }

    /// Add an existing tag
    pub fn with_tag(self, name: impl Into<String>) -> Self {
        self.lock().tags.push(name.into());
        self
    }

    /// Make every push fail with a remote error
    pub fn with_failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.lock().commits.clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.lock().tags.clone()
    }

    /// Pushes as `"<remote>"` for full pushes and `"<remote>:branch"` for branch-only pushes
    pub fn pushes(&self) -> Vec<String> {
        self.lock().pushes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_push(&self, push: String) -> Result<()> {
        if self.fail_push {
            return Err(ReleaseError::remote("remote rejected the push"));
        }
        self.lock().pushes.push(push);
        Ok(())
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn uncommitted_changes(&self) -> Result<Vec<String>> {
        Ok(self.uncommitted.clone())
    }

    fn commit(&self, message: &str, files: &CommitFiles) -> Result<()> {
        self.lock().commits.push(RecordedCommit {
            message: message.to_string(),
            files: files.clone(),
            empty: false,
        });
        Ok(())
    }

    fn commit_empty(&self, message: &str) -> Result<()> {
        self.lock().commits.push(RecordedCommit {
            message: message.to_string(),
            files: CommitFiles::default(),
            empty: true,
        });
        Ok(())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if state.tags.iter().any(|tag| tag == name) {
            return Err(ReleaseError::state(format!("Tag '{}' already exists", name)));
        }
        state.tags.push(name.to_string());
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock().tags.iter().any(|tag| tag == name))
    }

    fn push(&self, remote: &str) -> Result<()> {
        self.record_push(remote.to_string())
    }

    fn push_branch(&self, remote: &str) -> Result<()> {
        self.record_push(format!("{}:branch", remote))
    }

    fn commits_since_last_tag(&self) -> Result<Vec<CommitInfo>> {
        Ok(self.commits_since_last_tag.clone())
    }

    fn current_branch_name(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        self.remote_url
            .clone()
            .ok_or_else(|| ReleaseError::remote(format!("Remote '{}' is not configured", remote)))
    }
}
