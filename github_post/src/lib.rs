//! # github-post
//!
//! Files GitHub issues for tests that failed under stress.
//!
//! A stress job runs one Go package's tests over and over and streams `go test -v`
//! output to stdout. `github-post` reads that output, pulls out every failed test
//! together with the output it produced, and makes sure each failure is tracked by
//! exactly one open issue: a new issue is opened when none exists, otherwise the
//! failure is added as a comment to the existing one.
//!
//! ## Pipeline
//!
//! 1. **Configure**: build metadata (commit, CI server, build id, package, flags) is
//!    read from the environment once, before any input is consumed.
//! 2. **Scan**: [`scanner`] turns the console stream into [`scanner::FailureRecord`]s,
//!    lazily and in log order.
//! 3. **Identify**: [`report`] derives the issue title and renders a bounded body.
//! 4. **Deduplicate**: [`dedup`] searches for an open issue with the exact title.
//! 5. **Post**: [`reporter`] creates the issue or comments on the existing one
//!    through the [`tracker::IssueTracker`] seam.
//!
//! The first error stops the run. Nothing is retried.
//!
//! ## Modules
//!
//! - **`config`**: environment-derived [`config::RunMetadata`].
//! - **`scanner`**: Go test output state machine.
//! - **`report`**: issue identity and body rendering.
//! - **`dedup`**: open-issue lookup.
//! - **`tracker`**: the `IssueTracker` trait and its GitHub implementation.
//! - **`reporter`**: per-failure orchestration.
//! - **`shell`**: the `github-post` command line.

pub mod config;
pub mod dedup;
pub mod error;
pub mod report;
pub mod reporter;
pub mod scanner;
pub mod shell;
pub mod tracker;
pub mod utils;

pub use config::{Repository, RunMetadata};
pub use error::{ConfigError, ReportError, Result};
pub use reporter::{ReportOutcome, Reporter, RunSummary};
pub use scanner::{FailureRecord, scan};
pub use tracker::IssueTracker;
