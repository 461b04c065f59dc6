mod config;
mod context;
mod github;
mod output;
mod pr;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use crate::context::{EventContext, RepoSlug};
use crate::github::{GitHubClient, PullRequestApi};
use crate::output::OutputTarget;
use crate::pr::ChangedFiles;

/// pr-changed-files — lists the files a GitHub Pull Request creates, updates and
/// deletes, optionally filtered by a filename regex.
///
/// Every input can be given as a flag or through the environment GitHub Actions
/// provides, so the binary runs unchanged as an action step.
#[derive(Parser, Debug)]
#[command(name = "pr-changed-files", version, about)]
struct Cli {
    /// Token used to call the GitHub API
    #[arg(long, env = "INPUT_REPO-TOKEN", hide_env_values = true)]
    repo_token: Option<String>,

    /// Regex a filename must match to be reported (default: every file)
    #[arg(long, env = "INPUT_PATTERN")]
    pattern: Option<String>,

    /// Pull request number. Taken from the triggering event when omitted.
    #[arg(long, env = "INPUT_PR-NUMBER")]
    pr_number: Option<String>,

    /// Repository as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Path to the triggering event's JSON payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// GitHub REST API root
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// Directory receiving the files_*.json results (default: $HOME)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Step output file; outputs are printed to stdout when unset
    #[arg(long, env = "GITHUB_OUTPUT")]
    github_output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            output::report_failure(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let repository = RepoSlug::from_input(cli.repository.as_deref())?;
    let span = info_span!("changed_files", repo = %repository);

    async move {
        info!("loading configuration");
        let config = config::Config::load()?;
        let token = config.repo_token(cli.repo_token.as_deref())?;
        let api_url = config.api_url(cli.api_url.as_deref());
        let pattern = config.pattern(cli.pattern.as_deref());
        debug!(api_url = %api_url, pattern = ?pattern, "resolved inputs");

        let context = EventContext::load(repository, cli.event_path.as_deref())?;
        let client = GitHubClient::new(&api_url, &token)?;
        let target = OutputTarget {
            dir: cli.output_dir.unwrap_or_else(output::default_dir),
            step_outputs: cli.github_output,
        };

        run_with(
            &client,
            cli.pr_number.as_deref(),
            pattern.as_deref(),
            &context,
            &target,
        )
        .await?;
        info!("done");
        Ok::<(), Box<dyn std::error::Error>>(())
    }
    .instrument(span)
    .await
}

/// Resolve, classify and emit. Nothing is emitted unless every fetch succeeded.
async fn run_with(
    api: &dyn PullRequestApi,
    pr_number: Option<&str>,
    pattern: Option<&str>,
    context: &EventContext,
    target: &OutputTarget,
) -> Result<ChangedFiles, Box<dyn std::error::Error>> {
    info!("resolving pull request");
    let pr = pr::resolve(api, pr_number, context).await?;
    info!(pr = pr.number, files = pr.changed_files, "resolved pull request");

    let changed = pr::classify(api, &pr, pattern).await?;
    debug!(count = changed.count(), pr = pr.number, "found changed files");

    output::emit(&changed, target)?;
    output::print_summary(&changed, &pr);
    Ok(changed)
}
