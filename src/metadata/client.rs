//! Hosting API client
//!
//! Minimal read-only client for the hosting API. Every call performs exactly one request
//! and classifies the response; nothing is retried.

use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const LOG_TARGET: &str = "    client";
const USER_AGENT: &str = concat!("repo-glance/", env!("CARGO_PKG_VERSION"));

/// Media type for JSON API responses
pub const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Media type asking the API to render markup documents to HTML
pub const HTML_MEDIA_TYPE: &str = "application/vnd.github.html+json";

/// Repository record with only the fields we need
#[derive(Debug, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub html_url: String,
    pub description: Option<String>,
    pub languages_url: Option<String>,
}

/// Entry of the commit listing
#[derive(Debug, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitDetail,
}

/// Git-level commit data nested in a commit listing entry
#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: Option<CommitAuthor>,
}

/// Git author of a commit
#[derive(Debug, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub date: DateTime<Utc>,
}

/// Minimal contributor record with only the fields we need
#[derive(Debug, Deserialize)]
pub struct Contributor {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub contributions: u64,
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Classified result of a single hosting API call
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// The request succeeded
    Ok(T),

    /// The requested resource does not exist (404)
    NotFound,

    /// The API refused the request due to rate limiting (403 or 429)
    RateLimited(Option<RateLimitInfo>),

    /// The request failed at the network level, returned an unexpected status, or produced
    /// a body that could not be decoded
    TransportError(ohno::AppError),
}

impl<T> FetchOutcome<T> {
    /// Continue with the success value, which may itself fail; failures pass through untouched.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> FetchOutcome<U>) -> FetchOutcome<U> {
        match self {
            Self::Ok(value) => f(value),
            Self::NotFound => FetchOutcome::NotFound,
            Self::RateLimited(info) => FetchOutcome::RateLimited(info),
            Self::TransportError(e) => FetchOutcome::TransportError(e),
        }
    }
}

/// Hosting API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new hosting API client for the given base URL.
    ///
    /// `timeout` bounds each individual request, connection included.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .into_app_err("building HTTP client")?;

        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Construct an API URL for a repository with optional path suffix
    #[must_use]
    pub fn repo_url(&self, owner: &str, repo: &str, suffix: &str) -> String {
        format!("{}/repos/{owner}/{repo}{suffix}", self.base_url)
    }

    /// Issue a single GET and classify the result, returning the body text on success.
    pub async fn fetch(&self, url: &str, accept: Option<&str>) -> FetchOutcome<String> {
        log::info!(target: LOG_TARGET, "Querying {url}");

        let resp = match self.client.get(url).header(ACCEPT, accept.unwrap_or(JSON_MEDIA_TYPE)).send().await {
            Ok(r) => r,
            Err(e) => {
                let error = app_err!("request to '{url}' failed: {e}");
                log::warn!(target: LOG_TARGET, "{error}");
                return FetchOutcome::TransportError(error);
            }
        };

        let status = resp.status();
        match classify_status(status) {
            StatusClass::Success => {}
            StatusClass::NotFound => {
                log::debug!(target: LOG_TARGET, "'{url}' not found");
                return FetchOutcome::NotFound;
            }
            StatusClass::RateLimited => {
                let rate_limit = extract_rate_limit_from_headers(resp.headers());
                match &rate_limit {
                    Some(rl) => log::warn!(
                        target: LOG_TARGET,
                        "Rate limited fetching '{url}' ({} remaining, resets at {})",
                        rl.remaining,
                        rl.reset_at.with_timezone(&chrono::Local).format("%T")
                    ),
                    None => log::warn!(target: LOG_TARGET, "Rate limited fetching '{url}'"),
                }
                return FetchOutcome::RateLimited(rate_limit);
            }
            StatusClass::Failed => {
                let error = app_err!("unexpected HTTP status {status} from '{url}'");
                log::warn!(target: LOG_TARGET, "{error}");
                return FetchOutcome::TransportError(error);
            }
        }

        match resp.text().await {
            Ok(body) => FetchOutcome::Ok(body),
            Err(e) => {
                let error = app_err!("reading response body from '{url}': {e}");
                log::warn!(target: LOG_TARGET, "{error}");
                FetchOutcome::TransportError(error)
            }
        }
    }

    /// Issue a single GET and decode the JSON body into `T`.
    ///
    /// Undecodable bodies are reported as [`FetchOutcome::TransportError`].
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> FetchOutcome<T> {
        self.fetch(url, Some(JSON_MEDIA_TYPE)).await.and_then(|body| match decode_body(&body) {
            Ok(value) => FetchOutcome::Ok(value),
            Err(e) => {
                let error = app_err!("malformed response from '{url}': {e}");
                log::warn!(target: LOG_TARGET, "{error}");
                FetchOutcome::TransportError(error)
            }
        })
    }
}

/// Decode a JSON body, treating an empty body as JSON `null`.
///
/// The contributors endpoint answers an empty repository with `204 No Content`, which lets
/// list-typed callers decode to an empty list via `Option`.
fn decode_body<T: DeserializeOwned>(body: &str) -> serde_json::Result<T> {
    if body.trim().is_empty() {
        serde_json::from_str("null")
    } else {
        serde_json::from_str(body)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum StatusClass {
    Success,
    NotFound,
    RateLimited,
    Failed,
}

fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) {
        StatusClass::RateLimited
    } else if status == StatusCode::NOT_FOUND {
        StatusClass::NotFound
    } else {
        StatusClass::Failed
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
