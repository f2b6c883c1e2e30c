use regex::Regex;
use std::sync::OnceLock;

use crate::config::BranchesConfig;

fn non_version_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\-.]+").expect("valid branch regex"))
}

/// Decides which branches build canonical release artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPolicy {
    trunk: Vec<String>,
    release_prefix: String,
}

impl BranchPolicy {
    /// Create a policy from trunk branch names and a release branch prefix
    pub fn new(trunk: Vec<String>, release_prefix: impl Into<String>) -> Self {
        BranchPolicy {
            trunk,
            release_prefix: release_prefix.into(),
        }
    }

    /// Check if builds of `branch` are release candidates
    pub fn is_release_branch(&self, branch: &str) -> bool {
        self.trunk.iter().any(|name| name == branch)
            || (!self.release_prefix.is_empty() && branch.starts_with(&self.release_prefix))
    }

    /// Decorate `version` for non-release branches (e.g. `1.2.3-feature-x-SNAPSHOT`)
    pub fn artifact_version(&self, version: &str, branch: &str) -> String {
        if self.is_release_branch(branch) {
            version.to_string()
        } else {
            format!("{}-{}-SNAPSHOT", version, normalize_branch_name(branch))
        }
    }
}

impl Default for BranchPolicy {
    fn default() -> Self {
        BranchPolicy::from(&BranchesConfig::default())
    }
}

impl From<&BranchesConfig> for BranchPolicy {
    fn from(config: &BranchesConfig) -> Self {
        BranchPolicy::new(config.trunk.clone(), config.release_prefix.clone())
    }
}

/// Replace every run of characters outside `[A-Za-z0-9.-]` with a single `-`
pub fn normalize_branch_name(branch: &str) -> String {
    non_version_chars().replace_all(branch, "-").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_branch() {
        let policy = BranchPolicy::default();
        assert!(policy.is_release_branch("master"));
        assert_eq!(policy.artifact_version("1.2.3", "master"), "1.2.3");
    }

    #[test]
    fn test_release_prefix_branch() {
        let policy = BranchPolicy::default();
        assert!(policy.is_release_branch("release/1.x"));
        assert!(!policy.is_release_branch("releases"));
    }

    #[test]
    fn test_feature_branch() {
        let policy = BranchPolicy::default();
        assert!(!policy.is_release_branch("feature/some_name123"));
        assert_eq!(
            policy.artifact_version("1.2.3", "feature/some_name123"),
            "1.2.3-feature-some-name123-SNAPSHOT"
        );
    }

    #[test]
    fn test_configured_trunk() {
        let policy = BranchPolicy::new(vec!["master".into(), "main".into()], "release/");
        assert!(policy.is_release_branch("main"));
        assert!(!BranchPolicy::default().is_release_branch("main"));
    }

    #[test]
    fn test_normalize_collapses_runs() {
        assert_eq!(normalize_branch_name("a//b__c"), "a-b-c");
        assert_eq!(normalize_branch_name("fix/JIRA-12.v2"), "fix-JIRA-12.v2");
        assert_eq!(normalize_branch_name("feat/ünïcode"), "feat-n-code");
    }
}
