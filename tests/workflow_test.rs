// tests/workflow_test.rs
use std::env;
use std::fs;
use std::path::Path;

use artifact_release::boundary::ReleaseWarning;
use artifact_release::changelog::{FixedPullRequestLink, NEXT_VERSION_TYPE_MARKER};
use artifact_release::cli::ReleaseWorkflow;
use artifact_release::config::{GitConfig, ReleaseConfig};
use artifact_release::git::{CommitFiles, Git2Repository, MockRepository, Repository};
use artifact_release::ReleaseError;
use git2::RepositoryInitOptions;
use serial_test::serial;

const CHANGELOG: &str = "### NEXT_VERSION_TYPE=MINOR
### NEXT_VERSION_DESCRIPTION_BEGIN
* added export of reports
### NEXT_VERSION_DESCRIPTION_END
## [1.0.0]() (01-02-2024)

first release
";

fn project(changelog: Option<&str>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("gradle.properties"),
        "group=ru.example\nversion=1.0.1-SNAPSHOT\n",
    )
    .unwrap();
    if let Some(changelog) = changelog {
        fs::write(dir.path().join("CHANGELOG.md"), changelog).unwrap();
    }
    dir
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}

fn no_link() -> FixedPullRequestLink {
    FixedPullRequestLink(None)
}

#[test]
fn test_full_release_cycle() {
    let dir = project(Some(CHANGELOG));
    let config = ReleaseConfig::default();
    let repo = MockRepository::new();
    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());

    workflow.check_changelog().unwrap();

    let link = FixedPullRequestLink(Some("https://github.com/org/reports/pull/3".to_string()));
    let rotated = workflow.rotate(&link).unwrap();
    assert_eq!(rotated.version, "1.1.0");
    assert_eq!(rotated.previous_version.unwrap().to_string(), "1.0.0");
    assert_eq!(rotated.description.as_deref(), Some("* added export of reports"));
    assert!(rotated.warnings.is_empty());
    assert!(read(dir.path(), "gradle.properties").contains("version=1.1.0\n"));
    assert!(read(dir.path(), "CHANGELOG.md")
        .starts_with("## [1.1.0](https://github.com/org/reports/pull/3) ("));
    assert_eq!(
        read(dir.path(), "build/release/release-changelog.md"),
        "* added export of reports"
    );

    // Builds during the release window use the stored version
    let version = workflow.artifact_version().unwrap();
    assert_eq!(version.resolved.version, "1.1.0");

    workflow.check_release().unwrap();
    workflow.pre_release().unwrap();
    workflow.check_pre_release_executed().unwrap();
    let released = workflow.release().unwrap();
    assert_eq!(released.summary, "Next development version is 1.1.1-SNAPSHOT");

    let messages: Vec<String> = repo.commits().into_iter().map(|c| c.message).collect();
    assert_eq!(
        messages,
        vec![
            "[Artifact Release] Check push".to_string(),
            "[Artifact Release] - pre tag commit: '1.1.0'.".to_string(),
            "[Artifact Release] - new version commit: '1.1.1-SNAPSHOT'.".to_string(),
        ]
    );
    assert_eq!(repo.tags(), vec!["1.1.0"]);
    assert_eq!(repo.pushes(), vec!["origin:branch", "origin"]);

    let commit = &repo.commits()[1];
    assert!(commit.files.always.contains(&dir.path().join("CHANGELOG.md")));
    assert!(commit.files.always.contains(&dir.path().join("gradle.properties")));

    assert!(read(dir.path(), "gradle.properties").contains("version=1.1.1-SNAPSHOT\n"));
    assert!(read(dir.path(), "CHANGELOG.md").starts_with(NEXT_VERSION_TYPE_MARKER));
}

#[test]
fn test_check_changelog_failures() {
    let config = ReleaseConfig::default();
    let repo = MockRepository::new();

    let dir = project(None);
    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());
    assert!(matches!(
        workflow.check_changelog(),
        Err(ReleaseError::Config(_))
    ));

    let optional = ReleaseConfig {
        changelog_required: false,
        ..ReleaseConfig::default()
    };
    let workflow = ReleaseWorkflow::new(&repo, &optional, dir.path());
    let outcome = workflow.check_changelog().unwrap();
    assert!(matches!(
        outcome.warnings.as_slice(),
        [ReleaseWarning::ChangelogAbsent { .. }]
    ));

    let dir = project(Some(&CHANGELOG.replace("* added export of reports", "")));
    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());
    let err = workflow.check_changelog().unwrap_err();
    assert!(err.to_string().contains("NEXT_VERSION_DESCRIPTION_BEGIN"));

    let dir = project(Some(&CHANGELOG.replace("=MINOR", "=MAJOR")));
    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());
    let err = workflow.check_changelog().unwrap_err();
    assert!(err.to_string().contains("breaking changes"));
}

#[test]
fn test_rotate_refuses_uncommitted_changes() {
    let dir = project(Some(CHANGELOG));
    let config = ReleaseConfig::default();
    let repo = MockRepository::new().with_uncommitted("src/lib.rs");
    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());

    let err = workflow.rotate(&no_link()).unwrap_err();
    assert!(matches!(err, ReleaseError::State(_)));
    assert!(err.to_string().contains("src/lib.rs"));
    assert_eq!(read(dir.path(), "CHANGELOG.md"), CHANGELOG);
    assert_eq!(workflow.store().load_version().unwrap(), None);
}

#[test]
fn test_rotate_without_changelog_drops_snapshot() {
    let dir = project(None);
    let config = ReleaseConfig::default();
    let repo = MockRepository::new();
    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());

    let rotated = workflow.rotate(&no_link()).unwrap();
    assert_eq!(rotated.version, "1.0.1");
    assert_eq!(rotated.description, None);
    assert_eq!(workflow.store().load_version().unwrap().as_deref(), Some("1.0.1"));
    assert_eq!(workflow.store().load_changelog().unwrap(), None);
    assert!(read(dir.path(), "gradle.properties").contains("version=1.0.1\n"));
}

#[test]
fn test_missing_pull_request_link_is_a_warning() {
    let dir = project(Some(CHANGELOG));
    let config = ReleaseConfig::default();
    let repo = MockRepository::new();
    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());

    let rotated = workflow.rotate(&no_link()).unwrap();
    assert_eq!(rotated.warnings, vec![ReleaseWarning::PullRequestLinkUnavailable]);
    assert!(read(dir.path(), "CHANGELOG.md").starts_with("## [1.1.0]() ("));

    let dir = project(Some(CHANGELOG));
    let disabled = ReleaseConfig {
        add_pull_request_link: false,
        ..ReleaseConfig::default()
    };
    let workflow = ReleaseWorkflow::new(&repo, &disabled, dir.path());
    let link = FixedPullRequestLink(Some("https://ignored".to_string()));
    let rotated = workflow.rotate(&link).unwrap();
    assert!(rotated.warnings.is_empty());
    assert!(!read(dir.path(), "CHANGELOG.md").contains("ignored"));
}

#[test]
fn test_check_release_failures() {
    let dir = project(Some(CHANGELOG));
    let config = ReleaseConfig::default();

    let repo = MockRepository::new();
    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());
    let err = workflow.check_release().unwrap_err();
    assert_eq!(err.to_string(), "Release state error: Next release version is absent");
    assert!(workflow.pre_release().is_err());
    assert!(workflow.check_pre_release_executed().is_err());

    workflow.store().store_version("1.1.0").unwrap();

    let tagged = MockRepository::new().with_tag("1.1.0");
    let workflow = ReleaseWorkflow::new(&tagged, &config, dir.path());
    assert!(matches!(workflow.check_release(), Err(ReleaseError::State(_))));

    let rejected = MockRepository::new().with_failing_push();
    let workflow = ReleaseWorkflow::new(&rejected, &config, dir.path());
    let err = workflow.check_release().unwrap_err();
    assert!(matches!(err, ReleaseError::Remote(_)));
    assert!(err.to_string().contains("Push unsuccessful"));
}

#[test]
fn test_version_warns_without_release_type() {
    let dir = project(Some("## [1.0.0]() (01-02-2024)\n"));
    let config = ReleaseConfig::default();
    let repo = MockRepository::new();
    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());

    let outcome = workflow.artifact_version().unwrap();
    assert_eq!(outcome.resolved.version, "1.0.1");
    assert!(matches!(
        outcome.warnings.as_slice(),
        [ReleaseWarning::NoReleaseType { .. }]
    ));
}

#[test]
fn test_clean_forgets_release() {
    let dir = project(Some(CHANGELOG));
    let config = ReleaseConfig::default();
    let repo = MockRepository::new();
    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());

    workflow.rotate(&no_link()).unwrap();
    workflow.clean().unwrap();
    assert_eq!(workflow.store().load_version().unwrap(), None);
    assert!(workflow.check_pre_release_executed().is_err());
}

#[test]
fn test_release_against_local_remote() {
    let dir = project(Some(CHANGELOG));
    let remote_dir = tempfile::tempdir().unwrap();
    let remote = git2::Repository::init_bare(remote_dir.path()).unwrap();

    let mut options = RepositoryInitOptions::new();
    options.initial_head("master");
    let git = git2::Repository::init_opts(dir.path(), &options).unwrap();
    git.remote("origin", remote_dir.path().to_str().unwrap())
        .unwrap();
    fs::write(dir.path().join(".gitignore"), "build/\n").unwrap();

    let config = ReleaseConfig {
        git: GitConfig {
            username: Some("Release Bot".to_string()),
            email: Some("release@example.com".to_string()),
            allowed_files_to_commit: vec![r"\.gitignore".to_string()],
            ..GitConfig::default()
        },
        ..ReleaseConfig::default()
    };
    let repo = Git2Repository::from_git2(git, config.git.clone());
    repo.commit(
        "initial",
        &CommitFiles {
            always: vec![
                dir.path().join("CHANGELOG.md"),
                dir.path().join("gradle.properties"),
            ],
            allowed_untracked: config.git.allowed_files_to_commit.clone(),
        },
    )
    .unwrap();
    assert!(!repo.has_uncommitted_changes().unwrap());

    let workflow = ReleaseWorkflow::new(&repo, &config, dir.path());
    workflow.check_changelog().unwrap();
    workflow.rotate(&no_link()).unwrap();
    workflow.check_release().unwrap();
    workflow.pre_release().unwrap();
    assert!(!repo.has_uncommitted_changes().unwrap());
    workflow.check_pre_release_executed().unwrap();
    workflow.release().unwrap();

    assert!(repo.tag_exists("1.1.0").unwrap());
    assert!(remote.find_reference("refs/tags/1.1.0").is_ok());

    let head = remote
        .find_reference("refs/heads/master")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(
        head.message(),
        Some("[Artifact Release] - new version commit: '1.1.1-SNAPSHOT'.")
    );
    let head_tree = head.tree().unwrap();
    let properties = head_tree.get_name("gradle.properties").unwrap();
    let blob = remote.find_blob(properties.id()).unwrap();
    assert_eq!(
        std::str::from_utf8(blob.content()).unwrap(),
        "group=ru.example\nversion=1.1.1-SNAPSHOT\n"
    );

    // Nothing newer than the release tag except the next version commit
    let since_tag = repo.commits_since_last_tag().unwrap();
    assert_eq!(since_tag.len(), 1);
}

#[test]
#[serial]
fn test_pre_release_from_current_directory() {
    let dir = project(Some(CHANGELOG));
    let mut options = RepositoryInitOptions::new();
    options.initial_head("master");
    let git = git2::Repository::init_opts(dir.path(), &options).unwrap();
    fs::write(dir.path().join(".gitignore"), "build/\n").unwrap();

    let config = ReleaseConfig {
        git: GitConfig {
            username: Some("Release Bot".to_string()),
            email: Some("release@example.com".to_string()),
            allowed_files_to_commit: vec![r"\.gitignore".to_string()],
            ..GitConfig::default()
        },
        ..ReleaseConfig::default()
    };
    let repo = Git2Repository::from_git2(git, config.git.clone());

    let original = env::current_dir().unwrap();
    env::set_current_dir(dir.path()).unwrap();
    let result = (|| -> artifact_release::Result<()> {
        let here = Path::new(".");
        repo.commit(
            "initial",
            &CommitFiles {
                always: vec![here.join("CHANGELOG.md"), here.join("gradle.properties")],
                allowed_untracked: config.git.allowed_files_to_commit.clone(),
            },
        )?;
        let workflow = ReleaseWorkflow::new(&repo, &config, here);
        workflow.rotate(&no_link())?;
        workflow.pre_release()?;
        Ok(())
    })();
    env::set_current_dir(original).unwrap();
    result.unwrap();

    assert!(!repo.has_uncommitted_changes().unwrap());
    assert!(repo.tag_exists("1.1.0").unwrap());

    let git = git2::Repository::open(dir.path()).unwrap();
    let head = git.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(
        head.message(),
        Some("[Artifact Release] - pre tag commit: '1.1.0'.")
    );
    let head_tree = head.tree().unwrap();
    let properties = head_tree.get_name("gradle.properties").unwrap();
    let blob = git.find_blob(properties.id()).unwrap();
    assert_eq!(
        std::str::from_utf8(blob.content()).unwrap(),
        "group=ru.example\nversion=1.1.0\n"
    );
}
