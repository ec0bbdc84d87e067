//! # github-post CLI
//!
//! Command-line definition and entry point. All configuration is resolved here,
//! before any input is read, so a misconfigured build fails fast.

use crate::config::{DEFAULT_OWNER, DEFAULT_REPO, Repository, RunMetadata, github_token};
use crate::reporter::Reporter;
use crate::utils::logging::init_logging;
use anyhow::{Context, Result};
use clap::Parser;
use github_post_client::{DEFAULT_API_URL, GitHubClient};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

/// Posts failed stress-test runs to GitHub issues.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "github-post reads the console output of a stress run and files one GitHub
issue per failed test, or comments on the open issue that already tracks it.

Run metadata comes from the environment:
  BUILD_VCS_NUMBER, TC_SERVER_URL, TC_BUILD_ID, PKG (required)
  TAGS, GOFLAGS (optional)
  GITHUB_API_TOKEN (required)

Example: make stress PKG=./pkg/storage 2>&1 | github-post"
)]
pub struct Cli {
    /// Stress output to scan. Reads stdin when omitted or "-"
    pub input: Option<PathBuf>,

    /// Owner of the repository issues are filed against
    #[arg(long, default_value = DEFAULT_OWNER)]
    pub owner: String,

    /// Repository issues are filed against
    #[arg(long, default_value = DEFAULT_REPO)]
    pub repo: String,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub github_api_url: String,

    /// Timeout for each GitHub request in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Log to a rolling file in the cache directory instead of stderr
    #[arg(long)]
    pub log_to_file: bool,
}

/// Parse arguments and run.
pub async fn run() -> Result<()> {
    run_with(Cli::parse()).await
}

/// Run with already-parsed arguments.
pub async fn run_with(cli: Cli) -> Result<()> {
    let log_level = if cli.debug { "debug" } else { "info" };
    init_logging(log_level, cli.log_to_file)?;

    let metadata = RunMetadata::from_env()
        .context("Failed to load run metadata from the environment")?
        .with_repository(Repository::new(cli.owner.clone(), cli.repo.clone()));
    let token = github_token(|name| std::env::var(name).ok())?;
    let api_url = Url::parse(&cli.github_api_url)
        .with_context(|| format!("Invalid GitHub API URL '{}'", cli.github_api_url))?;
    let client = GitHubClient::new(api_url, &token, Duration::from_secs(cli.timeout))
        .context("Failed to build GitHub client")?;

    let input = open_input(cli.input.as_deref())?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, abandoning pending GitHub requests");
                cancel.cancel();
            }
        }
    });

    info!(
        package = %metadata.import_path(),
        sha = %metadata.sha,
        build_id = metadata.build_id,
        repository = %metadata.repository,
        "Scanning stress output"
    );

    let summary = Reporter::new(&client, &metadata)
        .with_cancellation(cancel)
        .run(input)
        .await?;

    if summary.reports.is_empty() {
        info!("No failed tests found");
    }
    Ok(())
}

/// Open `path` for reading, or stdin for `None` and `-`.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        None => Ok(Box::new(io::stdin().lock())),
        Some(p) if p == Path::new("-") => Ok(Box::new(io::stdin().lock())),
        Some(p) => {
            let file = File::open(p).with_context(|| format!("Failed to open {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["github-post"]).unwrap();
        assert!(cli.input.is_none());
        assert_eq!(cli.owner, "cockroachdb");
        assert_eq!(cli.repo, "cockroach");
        assert_eq!(cli.timeout, 60);
        assert!(!cli.debug);
        assert!(!cli.log_to_file);
    }

    #[test]
    fn test_explicit_arguments() {
        let cli = Cli::try_parse_from([
            "github-post",
            "--owner",
            "acme",
            "--repo",
            "widgets",
            "--github-api-url",
            "http://localhost:9999",
            "--timeout",
            "5",
            "--debug",
            "stress.log",
        ])
        .unwrap();
        assert_eq!(cli.input.as_deref(), Some(Path::new("stress.log")));
        assert_eq!(cli.owner, "acme");
        assert_eq!(cli.repo, "widgets");
        assert_eq!(cli.github_api_url, "http://localhost:9999");
        assert_eq!(cli.timeout, 5);
        assert!(cli.debug);
    }

    #[test]
    fn test_open_input_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "=== RUN   TestA").unwrap();
        let mut reader = open_input(Some(file.path())).unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "=== RUN   TestA\n");
    }

    #[test]
    fn test_open_input_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = open_input(Some(&tmp.path().join("nope.log")))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("Failed to open"));
    }
}
