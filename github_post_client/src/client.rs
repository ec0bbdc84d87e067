use crate::error::{GitHubError, Result};
use crate::models::{
    ApiErrorBody, Issue, IssueComment, IssueCommentRequest, IssueRequest, IssueSearchResult,
    SearchOptions,
};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";
const ERROR_BODY_LIMIT: usize = 800;

/// Thin REST client for the three issue endpoints the poster needs.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
}

impl GitHubClient {
    pub fn new(api_base: Url, token: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("github-post/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|e| GitHubError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, api_base })
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Opens a new issue in `owner/repo`.
    pub async fn create_issue(&self, owner: &str, repo: &str, issue: &IssueRequest) -> Result<Issue> {
        let url = self.endpoint(&["repos", owner, repo, "issues"])?;
        debug!(%url, title = %issue.title, "creating issue");
        self.send_json("create issue", self.http.post(url).json(issue))
            .await
    }

    /// Runs an issue search. `query` uses GitHub search syntax.
    pub async fn search_issues(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<IssueSearchResult> {
        let mut url = self.endpoint(&["search", "issues"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("per_page", &options.per_page.to_string())
            .append_pair("page", &options.page.to_string());
        debug!(query, "searching issues");
        self.send_json("search issues", self.http.get(url)).await
    }

    /// Adds a comment to issue `number` in `owner/repo`.
    pub async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        comment: &IssueCommentRequest,
    ) -> Result<IssueComment> {
        let number = number.to_string();
        let url = self.endpoint(&["repos", owner, repo, "issues", &number, "comments"])?;
        debug!(%url, "creating issue comment");
        self.send_json("create comment", self.http.post(url).json(comment))
            .await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| GitHubError::UrlParse(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) => parsed.message,
            Err(_) => truncate_for_error(&body, ERROR_BODY_LIMIT),
        };
        warn!(operation, status = status.as_u16(), %message, "GitHub API request failed");
        Err(GitHubError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn truncate_for_error(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GitHubClient {
        GitHubClient::new(Url::parse(base).unwrap(), "token", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_appends_segments_to_root() {
        let client = client("https://api.github.com");
        let url = client.endpoint(&["repos", "o", "r", "issues"]).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/o/r/issues");
    }

    #[test]
    fn endpoint_keeps_enterprise_prefix() {
        let client = client("https://ghe.example.com/api/v3/");
        let url = client.endpoint(&["search", "issues"]).unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/search/issues");
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let result = GitHubClient::new(
            Url::parse(DEFAULT_API_URL).unwrap(),
            "abc\ndef",
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(GitHubError::InvalidToken(_))));
    }

    #[test]
    fn truncate_for_error_marks_cut_bodies() {
        assert_eq!(truncate_for_error("short", 10), "short");
        assert_eq!(truncate_for_error("abcdef", 3), "abc...");
    }
}
