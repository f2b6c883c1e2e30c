use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use artifact_release::changelog::FixedPullRequestLink;
use artifact_release::cli::{PhaseOutcome, ReleaseWorkflow};
use artifact_release::config::{self, ReleaseConfig};
use artifact_release::git::Git2Repository;
use artifact_release::{telemetry, ui};

#[derive(Parser)]
#[command(
    name = "artifact-release",
    version,
    about = "Release semantic versions from the project changelog"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        short = 'C',
        long,
        global = true,
        default_value = ".",
        help = "Project directory"
    )]
    project_dir: PathBuf,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[arg(short, long, global = true, help = "Skip confirmation prompts")]
    force: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the changelog describes the next version
    CheckChangelog,
    /// Release the changelog entry and set the release version
    Rotate {
        #[arg(long, help = "Pull request link for the released changelog entry")]
        pull_request_link: Option<String>,
    },
    /// Fail if the release tag exists or the remote rejects pushes
    CheckRelease,
    /// Commit the release and tag it
    PreRelease,
    /// Fail if no pre-release was executed
    CheckPreReleaseExecuted,
    /// Bump to the next snapshot version and push
    Release,
    /// Print the version of the artifact built right now
    Version,
    /// Remove the stored release state
    Clean,
}

fn main() {
    let args = Args::parse();
    telemetry::init_tracing(if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    });

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn open_repository(project_dir: &Path, config: &ReleaseConfig) -> Result<Git2Repository> {
    Git2Repository::open(project_dir, config.git.clone())
        .with_context(|| format!("Not a git repository: {}", project_dir.display()))
}

fn report(outcome: PhaseOutcome) {
    for warning in &outcome.warnings {
        ui::display_boundary_warning(warning);
    }
    ui::display_success(&outcome.summary);
}

fn run(args: Args) -> Result<()> {
    let project_dir = args
        .project_dir
        .canonicalize()
        .with_context(|| format!("Cannot open project directory: {}", args.project_dir.display()))?;
    let config = config::load_project_config(&project_dir, args.config.as_deref())?;
    let repo = open_repository(&project_dir, &config)?;
    let workflow = ReleaseWorkflow::new(&repo, &config, &project_dir);

    match args.command {
        Command::CheckChangelog => report(workflow.check_changelog()?),
        Command::Rotate { pull_request_link } => {
            ui::display_status("Rotating release version...");
            let outcome = workflow.rotate(&FixedPullRequestLink(pull_request_link))?;
            for warning in &outcome.warnings {
                ui::display_boundary_warning(warning);
            }
            ui::display_version_change(outcome.previous_version.as_ref(), &outcome.version);
            if let Some(description) = &outcome.description {
                ui::display_release_description(description);
            }
            ui::display_success(&format!("Release version {} stored", outcome.version));
        }
        Command::CheckRelease => {
            ui::display_status(&format!("Checking push to '{}'...", config.git.remote));
            report(workflow.check_release()?);
        }
        Command::PreRelease => report(workflow.pre_release()?),
        Command::CheckPreReleaseExecuted => report(workflow.check_pre_release_executed()?),
        Command::Release => {
            ui::display_status(&format!("Pushing release to '{}'...", config.git.remote));
            report(workflow.release()?);
        }
        Command::Version => {
            let outcome = workflow.artifact_version()?;
            for warning in &outcome.warnings {
                ui::display_boundary_warning(warning);
            }
            println!("{}", outcome.resolved.version);
        }
        Command::Clean => {
            if !args.force && !ui::confirm_action("Remove the stored release state?")? {
                println!("Operation cancelled by user.");
                return Ok(());
            }
            report(workflow.clean()?);
        }
    }

    Ok(())
}
