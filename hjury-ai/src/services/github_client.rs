//! GitHub repository accessibility checks
//!
//! Layer 1 only needs to know whether a project's repository exists and is
//! public. `RepositoryInspector` is the seam; `GithubClient` talks to the
//! GitHub REST API.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

const GITHUB_API_URL: &str = "https://api.github.com";

/// Repository lookup errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Invalid GitHub repository URL: {0}")]
    InvalidUrl(String),

    #[error("GitHub API request failed: {0}")]
    Network(String),

    #[error("Failed to parse GitHub response: {0}")]
    Parse(String),
}

/// `owner/name` pair of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubRepo {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for GithubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Result of an accessibility check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryAccess {
    pub accessible: bool,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RepositoryAccess {
    pub fn public() -> Self {
        Self {
            accessible: true,
            is_public: true,
            error: None,
        }
    }

    pub fn inaccessible(error: impl Into<String>) -> Self {
        Self {
            accessible: false,
            is_public: false,
            error: Some(error.into()),
        }
    }
}

/// Capability used by layer 1 to check repositories
#[async_trait]
pub trait RepositoryInspector: Send + Sync {
    async fn inspect(&self, repo: &GithubRepo) -> Result<RepositoryAccess, RepositoryError>;
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Parse a repository reference into owner/name
///
/// Accepts `https://github.com/owner/repo`, the same without scheme, trailing
/// `.git` or extra path segments, and `git@github.com:owner/repo.git`.
pub fn parse_github_url(reference: &str) -> Result<GithubRepo, RepositoryError> {
    let trimmed = reference.trim();
    let invalid = || RepositoryError::InvalidUrl(trimmed.to_string());

    let normalized = if let Some(path) = trimmed.strip_prefix("git@github.com:") {
        format!("https://github.com/{}", path)
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&normalized).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    match url.host_str() {
        Some("github.com") | Some("www.github.com") => {}
        _ => return Err(invalid()),
    }

    let mut segments = url
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let name = segments.next().ok_or_else(invalid)?;
    let name = name.strip_suffix(".git").unwrap_or(name);

    if !is_valid_segment(owner) || !is_valid_segment(name) {
        return Err(invalid());
    }

    Ok(GithubRepo {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct GithubRepoResponse {
    #[serde(default)]
    private: bool,
}

/// GitHub REST API client
///
/// Requests are throttled by a token bucket so a full batch of layer 1
/// checks cannot exceed the configured request rate.
pub struct GithubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl GithubClient {
    pub fn new(token: Option<String>, requests_per_second: u32) -> Result<Self, RepositoryError> {
        Self::with_base_url(GITHUB_API_URL.to_string(), token, requests_per_second)
    }

    pub fn with_base_url(
        base_url: String,
        token: Option<String>,
        requests_per_second: u32,
    ) -> Result<Self, RepositoryError> {
        let client = Client::builder()
            .user_agent(hjury_common::config::get_user_agent())
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

#[async_trait]
impl RepositoryInspector for GithubClient {
    async fn inspect(&self, repo: &GithubRepo) -> Result<RepositoryAccess, RepositoryError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/repos/{}/{}", self.base_url, repo.owner, repo.name);
        tracing::debug!(repo = %repo, "Querying GitHub repository");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let body: GithubRepoResponse = response
                    .json()
                    .await
                    .map_err(|e| RepositoryError::Parse(e.to_string()))?;
                Ok(RepositoryAccess {
                    accessible: true,
                    is_public: !body.private,
                    error: None,
                })
            }
            StatusCode::NOT_FOUND => Ok(RepositoryAccess::inaccessible(
                "Repository not found or private",
            )),
            status => Ok(RepositoryAccess::inaccessible(format!(
                "GitHub API returned status {}",
                status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_forms() {
        let expected = GithubRepo {
            owner: "acme".to_string(),
            name: "widget".to_string(),
        };
        for reference in [
            "https://github.com/acme/widget",
            "https://github.com/acme/widget/",
            "https://github.com/acme/widget.git",
            "http://www.github.com/acme/widget/tree/main/src",
            "github.com/acme/widget",
            "  https://github.com/acme/widget  ",
            "git@github.com:acme/widget.git",
        ] {
            assert_eq!(parse_github_url(reference).unwrap(), expected, "{}", reference);
        }
    }

    #[test]
    fn test_parse_rejects_invalid_references() {
        for reference in [
            "not a url",
            "https://gitlab.com/acme/widget",
            "https://github.com/acme",
            "https://github.com/",
            "ftp://github.com/acme/widget",
            "https://github.com/ac me/widget",
        ] {
            let err = parse_github_url(reference).unwrap_err();
            assert!(
                err.to_string().starts_with("Invalid GitHub repository URL"),
                "{}",
                reference
            );
        }
    }

    #[test]
    fn test_client_ignores_blank_token() {
        let client = GithubClient::new(Some("   ".to_string()), 5).unwrap();
        assert!(client.token.is_none());
        assert_eq!(client.base_url, GITHUB_API_URL);
    }
}
