use github_post_client::GitHubError;
use thiserror::Error;

/// A required environment setting is missing or unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} is not set")]
    Missing { name: &'static str },

    #[error("environment variable {name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("package '{value}' does not start with the expected prefix '{prefix}'")]
    PackagePrefix { value: String, prefix: &'static str },
}

/// Errors that abort a reporting run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("failed to read test output: {0}")]
    Scan(#[from] std::io::Error),

    #[error("GitHub {operation} failed for {subject}: {source}")]
    Tracker {
        operation: &'static str,
        subject: String,
        #[source]
        source: GitHubError,
    },

    #[error("search {query} reported {total} matches but returned no issues")]
    EmptySearchPage { query: String, total: u64 },

    #[error("body for \"{title}\" is {length} bytes, over the {maximum} byte maximum")]
    BodyTooLong {
        title: String,
        length: usize,
        maximum: usize,
    },

    #[error("cancelled during {operation}")]
    Cancelled { operation: &'static str },
}

pub type Result<T> = std::result::Result<T, ReportError>;
