//! # Issue Identity and Body
//!
//! Turns a [`FailureRecord`] into the text that is sent to GitHub: the issue title
//! (which doubles as the deduplication key) and the report body.
//!
//! The body layout is fixed:
//!
//! ````text
//! SHA: https://github.com/<owner>/<repo>/commits/<sha>
//!
//! Parameters:
//! ```
//! TAGS=<tags>
//! GOFLAGS=<goflags>
//! ```
//!
//! Stress build found a failed test: <build log url>
//!
//! ```
//! <failure message>
//! ```
//! ````
//!
//! Rendering is a pure function of the record and the run metadata. Bodies that
//! would exceed [`GITHUB_ISSUE_BODY_MAXIMUM_LENGTH`] have only the failure message
//! shortened: its head is kept and [`TRUNCATION_MARKER`] is appended.

use crate::config::RunMetadata;
use crate::scanner::FailureRecord;
use std::borrow::Cow;
use std::fmt;

/// GitHub answers `422 Validation Failed` ("body is too long (maximum is 65536
/// characters)") for longer bodies. Counting bytes keeps us under it for any text.
pub const GITHUB_ISSUE_BODY_MAXIMUM_LENGTH: usize = (1 << 16) - 1;

/// Appended to a message that had to be cut.
pub const TRUNCATION_MARKER: &str = "\n[... truncated]";

const MESSAGE_FENCE_OPEN: &str = "\n\n```\n";
const MESSAGE_FENCE_CLOSE: &str = "\n```";

/// The (package, test) pair a failure is filed under. Equality is textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub package_name: String,
    pub test_name: String,
}

impl Identity {
    /// Issue title, also used verbatim as the search phrase.
    pub fn title(&self) -> String {
        format!("{}: {} failed under stress", self.package_name, self.test_name)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package_name, self.test_name)
    }
}

/// The identity of a record. The package name was fixed from the run metadata
/// when the record was scanned.
pub fn build_identity(record: &FailureRecord) -> Identity {
    Identity {
        package_name: record.package_name.clone(),
        test_name: record.test_name.clone(),
    }
}

/// Everything in the body before the failure message.
fn render_header(metadata: &RunMetadata) -> String {
    format!(
        "SHA: {}\n\nParameters:\n```\n{}\n```\n\nStress build found a failed test: {}",
        metadata.repository.commit_url(&metadata.sha),
        metadata.parameters().join("\n"),
        metadata.build_log_url(),
    )
}

/// Render the report body for `record`, cutting the message if the result would
/// be longer than [`GITHUB_ISSUE_BODY_MAXIMUM_LENGTH`].
///
/// The result can still be too long when the header alone does not fit; callers
/// check the length before sending.
pub fn build_body(record: &FailureRecord, metadata: &RunMetadata) -> String {
    let header = render_header(metadata);
    let overhead = header.len() + MESSAGE_FENCE_OPEN.len() + MESSAGE_FENCE_CLOSE.len();
    let budget = GITHUB_ISSUE_BODY_MAXIMUM_LENGTH.saturating_sub(overhead);
    let message = truncate_message(&record.message, budget);

    let mut body = String::with_capacity(overhead + message.len());
    body.push_str(&header);
    body.push_str(MESSAGE_FENCE_OPEN);
    body.push_str(&message);
    body.push_str(MESSAGE_FENCE_CLOSE);
    body
}

/// Shorten `message` to at most `budget` bytes, marker included.
///
/// Messages that fit are returned unchanged, so applying this to its own output
/// is a no-op. Cuts land on a UTF-8 character boundary. If `budget` is smaller
/// than the marker, the marker alone is returned.
pub fn truncate_message(message: &str, budget: usize) -> Cow<'_, str> {
    if message.len() <= budget {
        return Cow::Borrowed(message);
    }
    let mut end = budget.saturating_sub(TRUNCATION_MARKER.len());
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    let mut truncated = String::with_capacity(end + TRUNCATION_MARKER.len());
    truncated.push_str(&message[..end]);
    truncated.push_str(TRUNCATION_MARKER);
    Cow::Owned(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Repository;
    use url::Url;

    fn metadata() -> RunMetadata {
        RunMetadata {
            sha: "abcd123".to_string(),
            server_url: Url::parse("https://teamcity.example.com").unwrap(),
            build_id: 8008135,
            package_name: "foo/bar/baz".to_string(),
            tags: Some("deadlock".to_string()),
            go_flags: Some("race".to_string()),
            repository: Repository::default(),
        }
    }

    fn record(message: &str) -> FailureRecord {
        FailureRecord {
            package_name: "foo/bar/baz".to_string(),
            test_name: "TestReplicateQueueRebalance".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_identity_and_title() {
        let identity = build_identity(&record("x"));
        assert_eq!(identity.package_name, "foo/bar/baz");
        assert_eq!(identity.test_name, "TestReplicateQueueRebalance");
        assert_eq!(
            identity.title(),
            "foo/bar/baz: TestReplicateQueueRebalance failed under stress"
        );
    }

    #[test]
    fn test_body_layout() {
        let message = "\t<autogenerated>:12: not balanced: [10 1 10 1 8]";
        let body = build_body(&record(message), &metadata());
        let expected = format!(
            "SHA: https://github.com/cockroachdb/cockroach/commits/abcd123\n\
             \n\
             Parameters:\n\
             ```\n\
             TAGS=deadlock\n\
             GOFLAGS=race\n\
             ```\n\
             \n\
             Stress build found a failed test: \
             https://teamcity.example.com/viewLog.html?buildId=8008135&tab=buildLog\n\
             \n\
             ```\n\
             {message}\n\
             ```"
        );
        assert_eq!(body, expected);
    }

    #[test]
    fn test_parameter_block_emitted_when_empty() {
        let mut meta = metadata();
        meta.tags = None;
        meta.go_flags = None;
        let body = build_body(&record("m"), &meta);
        assert!(body.contains("Parameters:\n```\n\n```\n\n"));
    }

    #[test]
    fn test_body_is_deterministic() {
        let rec = record("same input");
        let meta = metadata();
        assert_eq!(build_body(&rec, &meta), build_body(&rec, &meta));
        assert_eq!(build_identity(&rec), build_identity(&rec));
    }

    #[test]
    fn test_oversized_message_is_cut_to_fit() {
        let meta = metadata();
        let rec = record(&"x".repeat(GITHUB_ISSUE_BODY_MAXIMUM_LENGTH * 2));
        let body = build_body(&rec, &meta);
        assert_eq!(body.len(), GITHUB_ISSUE_BODY_MAXIMUM_LENGTH);
        assert!(body.starts_with(&render_header(&meta)));
        assert!(body.ends_with(&format!("x{TRUNCATION_MARKER}\n```")));
    }

    #[test]
    fn test_message_that_exactly_fits_is_untouched() {
        let meta = metadata();
        let overhead =
            render_header(&meta).len() + MESSAGE_FENCE_OPEN.len() + MESSAGE_FENCE_CLOSE.len();
        let message = "y".repeat(GITHUB_ISSUE_BODY_MAXIMUM_LENGTH - overhead);
        let body = build_body(&record(&message), &meta);
        assert_eq!(body.len(), GITHUB_ISSUE_BODY_MAXIMUM_LENGTH);
        assert!(!body.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let message = "abcdefghijklmnopqrstuvwxyz".repeat(10);
        let once = truncate_message(&message, 50).into_owned();
        let twice = truncate_message(&once, 50).into_owned();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 50);
        assert!(once.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let message = "é".repeat(40);
        let cut = truncate_message(&message, TRUNCATION_MARKER.len() + 5);
        assert!(cut.len() <= TRUNCATION_MARKER.len() + 5);
        assert_eq!(cut.as_ref(), format!("éé{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_tiny_budget_yields_marker_only() {
        assert_eq!(truncate_message("long message", 3).as_ref(), TRUNCATION_MARKER);
        assert_eq!(truncate_message("ok", 3).as_ref(), "ok");
    }

    #[test]
    fn test_huge_header_cannot_fit() {
        let mut meta = metadata();
        meta.tags = Some("t".repeat(GITHUB_ISSUE_BODY_MAXIMUM_LENGTH));
        let body = build_body(&record("m"), &meta);
        assert!(body.len() > GITHUB_ISSUE_BODY_MAXIMUM_LENGTH);
    }
}
