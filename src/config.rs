use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "release.toml";

/// Represents the complete configuration for artifact-release.
///
/// Contains file locations, release gates, git settings and the release branch policy.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_changelog_file")]
    pub changelog_file: String,

    #[serde(default = "default_version_file")]
    pub version_file: String,

    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// Fail `check-changelog` when the changelog file is absent
    #[serde(default = "default_true")]
    pub changelog_required: bool,

    /// Put the release pull request link into the rotated changelog entry
    #[serde(default = "default_true")]
    pub add_pull_request_link: bool,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub branches: BranchesConfig,
}

fn default_changelog_file() -> String {
    "CHANGELOG.md".to_string()
}

fn default_version_file() -> String {
    "gradle.properties".to_string()
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_true() -> bool {
    true
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_trunk() -> Vec<String> {
    vec!["master".to_string()]
}

fn default_release_prefix() -> String {
    "release/".to_string()
}

/// Settings for commits, tags and pushes made during a release.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    /// Commit author name; the repository signature is used when unset
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub ssh_key_path: Option<PathBuf>,

    #[serde(default)]
    pub ssh_key_passphrase: Option<String>,

    #[serde(default = "default_remote")]
    pub remote: String,

    /// Regexes for untracked files that release commits may pick up
    #[serde(default)]
    pub allowed_files_to_commit: Vec<String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            username: None,
            email: None,
            ssh_key_path: None,
            ssh_key_passphrase: None,
            remote: default_remote(),
            allowed_files_to_commit: Vec::new(),
        }
    }
}

/// Branches whose builds produce release (non-snapshot) artifact versions.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchesConfig {
    #[serde(default = "default_trunk")]
    pub trunk: Vec<String>,

    #[serde(default = "default_release_prefix")]
    pub release_prefix: String,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        BranchesConfig {
            trunk: default_trunk(),
            release_prefix: default_release_prefix(),
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            changelog_file: default_changelog_file(),
            version_file: default_version_file(),
            build_dir: default_build_dir(),
            changelog_required: true,
            add_pull_request_link: true,
            git: GitConfig::default(),
            branches: BranchesConfig::default(),
        }
    }
}

impl ReleaseConfig {
    /// Changelog location inside `project_dir`
    pub fn changelog_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.changelog_file)
    }

    /// Project version declaration location inside `project_dir`
    pub fn version_file_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.version_file)
    }

    /// Build output directory inside `project_dir`
    pub fn build_dir_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.build_dir)
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ReleaseConfig> {
    toml::from_str(content).map_err(|e| ReleaseError::config(format!("Invalid config: {}", e)))
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release.toml` in current directory
/// 3. `.artifact-release.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(ReleaseConfig)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<ReleaseConfig> {
    load_project_config(Path::new("."), config_path)
}

/// Loads configuration for the project in `project_dir`.
///
/// Same lookup as [`load_config`], with `release.toml` taken from
/// `project_dir` instead of the current directory.
pub fn load_project_config(project_dir: &Path, config_path: Option<&Path>) -> Result<ReleaseConfig> {
    let project_config = project_dir.join(CONFIG_FILE_NAME);
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path).map_err(|e| {
            ReleaseError::config(format!("Cannot read config '{}': {}", path.display(), e))
        })?
    } else if project_config.exists() {
        fs::read_to_string(&project_config)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".artifact-release.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(ReleaseConfig::default());
        }
    } else {
        return Ok(ReleaseConfig::default());
    };

    tracing::debug!(project = %project_dir.display(), "configuration loaded");
    parse_config(&config_str)
}
