//! # Run Configuration
//!
//! The build server describes each stress run through environment variables. They
//! are read exactly once, at startup, into an immutable [`RunMetadata`] that is then
//! passed explicitly through the scanner, body builder and reporter.
//!
//! ## Variables
//!
//! - `BUILD_VCS_NUMBER` (required): revision under test.
//! - `TC_SERVER_URL` (required): build server base URL.
//! - `TC_BUILD_ID` (required): numeric build id.
//! - `PKG` (required): full import path of the stressed package. It must start
//!   with [`COCKROACH_PKG_PREFIX`]; the remainder becomes the package name used in
//!   issue titles.
//! - `TAGS`, `GOFLAGS` (optional): echoed in the report's parameter block.
//!
//! Loading goes through a lookup function so callers (and tests) decide where the
//! values come from. [`RunMetadata::from_env`] uses the process environment.

use crate::error::ConfigError;
use std::fmt;
use url::Url;

pub const VCS_NUMBER_ENV: &str = "BUILD_VCS_NUMBER";
pub const SERVER_URL_ENV: &str = "TC_SERVER_URL";
pub const BUILD_ID_ENV: &str = "TC_BUILD_ID";
pub const PKG_ENV: &str = "PKG";
pub const TAGS_ENV: &str = "TAGS";
pub const GOFLAGS_ENV: &str = "GOFLAGS";
pub const GITHUB_API_TOKEN_ENV: &str = "GITHUB_API_TOKEN";

/// Import path prefix stripped from `PKG` to form the package name.
pub const COCKROACH_PKG_PREFIX: &str = "github.com/cockroachdb/cockroach/pkg/";

pub const DEFAULT_OWNER: &str = "cockroachdb";
pub const DEFAULT_REPO: &str = "cockroach";

/// Owner and name of the repository issues are filed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Web link to the commit history ending at `sha`.
    pub fn commit_url(&self, sha: &str) -> String {
        format!("https://github.com/{}/{}/commits/{}", self.owner, self.name, sha)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new(DEFAULT_OWNER, DEFAULT_REPO)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Immutable description of one stress run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub sha: String,
    pub server_url: Url,
    pub build_id: u64,
    /// `PKG` with [`COCKROACH_PKG_PREFIX`] removed, e.g. `storage`.
    pub package_name: String,
    pub tags: Option<String>,
    pub go_flags: Option<String>,
    pub repository: Repository,
}

impl RunMetadata {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve each variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sha = required(&lookup, VCS_NUMBER_ENV)?;

        let raw_server_url = required(&lookup, SERVER_URL_ENV)?;
        let server_url = Url::parse(&raw_server_url).map_err(|e| ConfigError::Invalid {
            name: SERVER_URL_ENV,
            value: raw_server_url.clone(),
            reason: e.to_string(),
        })?;
        if server_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                name: SERVER_URL_ENV,
                value: raw_server_url,
                reason: "not a hierarchical URL".to_string(),
            });
        }

        let raw_build_id = required(&lookup, BUILD_ID_ENV)?;
        let build_id = raw_build_id
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name: BUILD_ID_ENV,
                value: raw_build_id.clone(),
                reason: e.to_string(),
            })?;

        let package = required(&lookup, PKG_ENV)?;
        let package_name = match package.strip_prefix(COCKROACH_PKG_PREFIX) {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => {
                return Err(ConfigError::PackagePrefix {
                    value: package,
                    prefix: COCKROACH_PKG_PREFIX,
                });
            }
        };

        Ok(Self {
            sha,
            server_url,
            build_id,
            package_name,
            tags: lookup(TAGS_ENV),
            go_flags: lookup(GOFLAGS_ENV),
            repository: Repository::default(),
        })
    }

    pub fn with_repository(mut self, repository: Repository) -> Self {
        self.repository = repository;
        self
    }

    /// Full import path of the stressed package.
    pub fn import_path(&self) -> String {
        format!("{COCKROACH_PKG_PREFIX}{}", self.package_name)
    }

    /// Link to this build's log on the build server.
    pub fn build_log_url(&self) -> Url {
        let mut url = self.server_url.clone();
        url.set_path("viewLog.html");
        url.set_fragment(None);
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("buildId", &self.build_id.to_string())
            .append_pair("tab", "buildLog");
        url
    }

    /// `NAME=value` lines for each optional parameter that is set, `TAGS` first.
    pub fn parameters(&self) -> Vec<String> {
        [(TAGS_ENV, &self.tags), (GOFLAGS_ENV, &self.go_flags)]
            .into_iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| format!("{name}={v}")))
            .collect()
    }
}

/// Read the GitHub token through `lookup`.
pub fn github_token<F>(lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    required(&lookup, GITHUB_API_TOKEN_ENV)
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing { name }),
    }
}
