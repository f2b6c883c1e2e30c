use crate::config::GitConfig;
use crate::error::{ReleaseError, Result};
use crate::git::{CommitFiles, CommitInfo};
use git2::{Oid, Repository as Git2Repo, Signature, StatusOptions};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    settings: GitConfig,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P, settings: GitConfig) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo, settings })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo, settings: GitConfig) -> Self {
        Git2Repository { repo, settings }
    }

    fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| ReleaseError::state("Bare repositories cannot be released"))
    }

    fn signature(&self) -> Result<Signature<'static>> {
        match (&self.settings.username, &self.settings.email) {
            (Some(name), Some(email)) => Ok(Signature::now(name, email)?),
            _ => self.repo.signature().map_err(|e| {
                ReleaseError::config(format!(
                    "git.username and git.email are not set and no git identity is configured: {}",
                    e
                ))
            }),
        }
    }

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Path of `file` relative to the work tree, if it lies inside it
    ///
    /// Relative paths are taken from the current directory, like git does.
    fn relative_to_workdir(&self, file: &Path) -> Result<Option<PathBuf>> {
        let workdir = self.workdir()?.canonicalize()?;
        let file = if file.is_relative() {
            std::env::current_dir()?.join(file)
        } else {
            file.to_path_buf()
        };
        let file = match file.canonicalize() {
            Ok(file) => file,
            Err(_) => return Ok(None),
        };
        Ok(file.strip_prefix(&workdir).ok().map(Path::to_path_buf))
    }

    fn untracked_files(&self) -> Result<Vec<String>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .filter(|entry| entry.status().contains(git2::Status::WT_NEW))
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect())
    }

    fn remote_callbacks(&self) -> git2::RemoteCallbacks<'static> {
        let ssh_key_path = self.settings.ssh_key_path.clone();
        let passphrase = self.settings.ssh_key_passphrase.clone();

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            let username = username_from_url.unwrap_or("git");

            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                // Configured key first
                if let Some(key) = ssh_key_path.as_deref() {
                    return git2::Cred::ssh_key(username, None, key, passphrase.as_deref());
                }

                // Try different key types in order of preference
                if let Some(home) = dirs::home_dir() {
                    for key_name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let path = home.join(".ssh").join(key_name);
                        if path.exists() {
                            if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                                return Ok(cred);
                            }
                        }
                    }
                }

                // Try SSH agent as fallback
                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
            }

            // Fall back to default credentials
            git2::Cred::default()
        });

        // A rejected reference fails the whole push
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "reference {} rejected: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        callbacks
    }

    fn push_refspecs(&self, remote_name: &str, refspecs: &[String]) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|e| {
            ReleaseError::remote(format!("Cannot find remote '{}': {}", remote_name, e))
        })?;

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(self.remote_callbacks());

        tracing::info!(remote = remote_name, refspecs = ?refspecs, "pushing");
        let refspec_strs: Vec<&str> = refspecs.iter().map(String::as_str).collect();
        remote
            .push(&refspec_strs, Some(&mut push_options))
            .map_err(|e| {
                // Provide more informative error message
                if e.class() == git2::ErrorClass::Net {
                    ReleaseError::remote(format!("Network error during push: {}", e))
                } else {
                    ReleaseError::remote(format!("Push to '{}' failed: {}", remote_name, e))
                }
            })
    }

    fn branch_refspec(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(ReleaseError::state("Cannot push from a detached HEAD"));
        }
        let name = head
            .name()
            .ok_or_else(|| ReleaseError::state("HEAD reference name is not valid UTF-8"))?;
        Ok(format!("{}:{}", name, name))
    }

    fn write_commit(&self, message: &str, tree_id: Oid) -> Result<()> {
        let signature = self.signature()?;
        let tree = self.repo.find_tree(tree_id)?;
        let parent = self.head_commit()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        tracing::info!(commit = %oid, "Commit: {}", message);
        Ok(())
    }
}

impl super::Repository for Git2Repository {
    fn uncommitted_changes(&self) -> Result<Vec<String>> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .filter(|entry| entry.status() != git2::Status::CURRENT)
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect())
    }

    fn commit(&self, message: &str, files: &CommitFiles) -> Result<()> {
        let mut index = self.repo.index()?;

        let patterns = files
            .allowed_untracked
            .iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                    ReleaseError::config(format!(
                        "Invalid allowed_files_to_commit pattern '{}': {}",
                        pattern, e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if !patterns.is_empty() {
            for file in self.untracked_files()? {
                if patterns.iter().any(|re| re.is_match(&file)) {
                    tracing::info!(file = %file, "Add file for commit");
                    index.add_path(Path::new(&file))?;
                }
            }
        }

        let workdir = self.workdir()?.to_path_buf();
        for file in &files.always {
            if let Some(relative) = self.relative_to_workdir(file)? {
                if workdir.join(&relative).is_file() {
                    tracing::info!(file = %relative.display(), "Add file for commit");
                    index.add_path(&relative)?;
                }
            }
        }

        // Stage modifications and deletions of tracked files
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        self.write_commit(message, tree_id)
    }

    fn commit_empty(&self, message: &str) -> Result<()> {
        let tree_id = match self.head_commit()? {
            Some(commit) => commit.tree_id(),
            None => self.repo.index()?.write_tree()?,
        };
        self.write_commit(message, tree_id)
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .map_err(|e| ReleaseError::state(format!("Cannot create tag '{}': {}", name, e)))?;
        tracing::info!(tag = name, "Tag created");
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn push(&self, remote: &str) -> Result<()> {
        let mut refspecs = vec![self.branch_refspec()?];
        let tags = self.repo.tag_names(None)?;
        refspecs.extend(
            tags.iter()
                .flatten()
                .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag)),
        );
        self.push_refspecs(remote, &refspecs)
    }

    fn push_branch(&self, remote: &str) -> Result<()> {
        let refspec = self.branch_refspec()?;
        self.push_refspecs(remote, &[refspec])
    }

    fn commits_since_last_tag(&self) -> Result<Vec<CommitInfo>> {
        let Some(head) = self.head_commit()? else {
            return Ok(Vec::new());
        };

        // Commits that carry a tag (handles both lightweight and annotated tags)
        let mut tagged = HashSet::new();
        let tags = self.repo.tag_names(None)?;
        for tag_name in tags.iter().flatten() {
            if let Ok(tag_ref) = self.repo.find_reference(&format!("refs/tags/{}", tag_name)) {
                if let Ok(commit) = tag_ref.peel_to_commit() {
                    tagged.insert(commit.id());
                }
            }
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(head.id())?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            if tagged.contains(&oid) {
                break;
            }
            let commit = self.repo.find_commit(oid)?;
            commits.push(CommitInfo {
                id: oid.to_string(),
                message: commit.message().unwrap_or("(empty message)").to_string(),
            });
        }

        Ok(commits)
    }

    fn current_branch_name(&self) -> Result<String> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                // Fresh repository: HEAD names a branch without commits
                let head = self.repo.find_reference("HEAD")?;
                let target = head.symbolic_target().unwrap_or("HEAD");
                return Ok(target.trim_start_matches("refs/heads/").to_string());
            }
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            head.shorthand()
                .map(str::to_string)
                .ok_or_else(|| ReleaseError::state("Branch name is not valid UTF-8"))
        } else {
            let oid = head
                .target()
                .ok_or_else(|| ReleaseError::state("HEAD is detached or invalid"))?;
            Ok(oid.to_string())
        }
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        let remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote: {}", e)))?;
        remote
            .url()
            .map(str::to_string)
            .ok_or_else(|| ReleaseError::remote("Remote URL is not valid UTF-8"))
    }
}
