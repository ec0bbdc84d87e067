use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL parsing failed: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("GitHub API responded with status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid API token: {0}")]
    InvalidToken(String),
}

pub type Result<T> = std::result::Result<T, GitHubError>;
