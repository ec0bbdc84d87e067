//! # Reporter
//!
//! Drives one stress log through the pipeline. Each failure moves through
//! [`ReportState`]: it is extracted by the scanner, identified, deduplicated
//! against open issues, and finally either filed as a new issue or added as a
//! comment to the issue that already tracks it.
//!
//! Records are handled one at a time, in log order. The first error of any kind
//! stops the run; nothing is retried and no later failure is reported, so a run
//! never files an issue on the strength of a failed search.

use crate::config::RunMetadata;
use crate::dedup;
use crate::error::{ReportError, Result};
use crate::report::{self, GITHUB_ISSUE_BODY_MAXIMUM_LENGTH, Identity};
use crate::scanner::{self, FailureRecord};
use crate::tracker::{IssueTracker, cancellable};
use github_post_client::{IssueCommentRequest, IssueRequest};
use std::fmt;
use std::io::BufRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Where a single failure is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportState {
    Extracted,
    Identified,
    Deduplicated,
    Created,
    Commented,
}

impl fmt::Display for ReportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportState::Extracted => "extracted",
            ReportState::Identified => "identified",
            ReportState::Deduplicated => "deduplicated",
            ReportState::Created => "created",
            ReportState::Commented => "commented",
        };
        f.write_str(name)
    }
}

/// Terminal result for one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Created { issue_number: u64 },
    Commented { issue_number: u64 },
}

impl ReportOutcome {
    pub fn state(&self) -> ReportState {
        match self {
            ReportOutcome::Created { .. } => ReportState::Created,
            ReportOutcome::Commented { .. } => ReportState::Commented,
        }
    }

    pub fn issue_number(&self) -> u64 {
        match self {
            ReportOutcome::Created { issue_number } | ReportOutcome::Commented { issue_number } => {
                *issue_number
            }
        }
    }
}

/// What a completed run did, in log order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: Vec<(Identity, ReportOutcome)>,
}

impl RunSummary {
    pub fn created(&self) -> usize {
        self.count(ReportState::Created)
    }

    pub fn commented(&self) -> usize {
        self.count(ReportState::Commented)
    }

    fn count(&self, state: ReportState) -> usize {
        self.reports
            .iter()
            .filter(|(_, outcome)| outcome.state() == state)
            .count()
    }
}

/// Reports the failures of one stress log through an [`IssueTracker`].
pub struct Reporter<'a, T: ?Sized> {
    tracker: &'a T,
    metadata: &'a RunMetadata,
    cancel: CancellationToken,
}

impl<'a, T> Reporter<'a, T>
where
    T: IssueTracker + ?Sized,
{
    pub fn new(tracker: &'a T, metadata: &'a RunMetadata) -> Self {
        Self {
            tracker,
            metadata,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort pending tracker calls when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(ReportError::Cancelled { operation: "scan" });
        }
        Ok(())
    }

    /// Scan `input` and report every failure in it.
    ///
    /// A cancellation observed at any point, including while the log is still
    /// being read, fails the run with [`ReportError::Cancelled`].
    pub async fn run<R: BufRead>(&self, input: R) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for record in scanner::scan(input, self.metadata.package_name.clone()) {
            let record = record?;
            self.check_cancelled()?;
            let outcome = self.report(&record).await?;
            summary.reports.push((report::build_identity(&record), outcome));
        }
        self.check_cancelled()?;
        info!(
            created = summary.created(),
            commented = summary.commented(),
            "stress failures reported"
        );
        Ok(summary)
    }

    /// File or comment on exactly one issue for `record`.
    pub async fn report(&self, record: &FailureRecord) -> Result<ReportOutcome> {
        debug!(
            state = %ReportState::Extracted,
            package = %record.package_name,
            test = %record.test_name,
            "failure"
        );

        let identity = report::build_identity(record);
        let title = identity.title();
        let body = report::build_body(record, self.metadata);
        if body.len() > GITHUB_ISSUE_BODY_MAXIMUM_LENGTH {
            return Err(ReportError::BodyTooLong {
                title,
                length: body.len(),
                maximum: GITHUB_ISSUE_BODY_MAXIMUM_LENGTH,
            });
        }
        debug!(state = %ReportState::Identified, %title, body_len = body.len(), "failure");

        let repository = &self.metadata.repository;
        let existing = dedup::find_existing(self.tracker, repository, &identity, &self.cancel).await?;
        debug!(state = %ReportState::Deduplicated, %title, ?existing, "failure");

        let outcome = match existing {
            None => {
                let request = IssueRequest {
                    title: title.clone(),
                    body,
                };
                let issue = cancellable(
                    &self.cancel,
                    "create issue",
                    &title,
                    self.tracker
                        .create_issue(&repository.owner, &repository.name, &request),
                )
                .await?;
                ReportOutcome::Created {
                    issue_number: issue.number,
                }
            }
            Some(number) => {
                let request = IssueCommentRequest { body };
                cancellable(
                    &self.cancel,
                    "post comment",
                    &title,
                    self.tracker
                        .post_comment(&repository.owner, &repository.name, number, &request),
                )
                .await?;
                ReportOutcome::Commented {
                    issue_number: number,
                }
            }
        };

        info!(
            state = %outcome.state(),
            %title,
            issue = outcome.issue_number(),
            "failure reported"
        );
        Ok(outcome)
    }
}
