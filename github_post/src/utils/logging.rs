//! # Logging Initialization
//!
//! Centralized setup for the `tracing` subscriber used by the `github-post` binary.
//!
//! - **Environment Filter (`EnvFilter`)**: `RUST_LOG` wins when set. Otherwise other
//!   crates log at `warn` and this workspace's crates at the requested level.
//! - **Stderr Logging (default)**: CI captures stderr next to the build log, so logs
//!   go there with ANSI colors.
//! - **File Logging (opt-in)**: with `log_to_file = true`, a daily rolling file is
//!   written to the user cache directory (from the `directories` crate) through
//!   `tracing_appender`. If that directory is not writable, logging falls back to
//!   stderr.
//!
//! Initialization runs at most once per process; later calls are no-ops.

use anyhow::Result;
use directories::ProjectDirs;
use std::{io::stderr, path::Path, sync::Once};
use tracing_subscriber::{EnvFilter, fmt::layer, prelude::*};

static INIT: Once = Once::new();

const LOG_FILE_NAME: &str = "github_post.log";

/// Default filter directives when `RUST_LOG` is not set.
pub fn default_filter(log_level: &str) -> String {
    format!("warn,github_post={log_level},github_post_client={log_level}")
}

/// Initializes the logging system.
///
/// # Errors
///
/// Currently infallible; the `Result` leaves room for subscriber setup errors.
pub fn init_logging(log_level: &str, log_to_file: bool) -> Result<()> {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

        if log_to_file
            && let Some(proj_dirs) = ProjectDirs::from("com", "GithubPost", "github_post")
        {
            let log_dir = proj_dirs.cache_dir();

            // tracing_appender::rolling::daily panics on permission errors, so probe first.
            if test_write_permission(log_dir) {
                let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer().with_writer(non_blocking).with_ansi(false))
                    .init();
                // Leaked so buffered lines are flushed at exit.
                Box::leak(Box::new(guard));
                return;
            }
        }

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer().with_writer(stderr).with_ansi(true))
            .init();
    });

    Ok(())
}

/// Create `dir` if needed and check that a file can be written in it.
fn test_write_permission(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }

    let test_file = dir.join(".github_post_log_test");
    match std::fs::write(&test_file, "test") {
        Ok(()) => {
            let _ = std::fs::remove_file(&test_file);
            true
        }
        Err(_) => false,
    }
}
