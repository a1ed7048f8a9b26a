//! Wire types for the subset of the GitHub REST API the crawler touches.
//!
//! Unknown fields are ignored everywhere; these structs name only what the
//! pipeline actually reads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A candidate repository as yielded by a listing or search endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RepoSummary {
    pub id: u64,
    pub full_name: String,
}

/// Full repository detail from `/repos/{owner}/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoDetails {
    pub id: u64,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    /// Repository size in kilobytes, as reported by the API.
    #[serde(default)]
    pub size: u64,
    pub default_branch: Option<String>,
    pub clone_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Response body of `/search/repositories`.
#[derive(Debug, Deserialize)]
pub struct SearchRepos {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<RepoSummary>,
}

/// Response body of `/search/issues` (only the total is used).
#[derive(Debug, Deserialize)]
pub struct SearchIssues {
    #[serde(default)]
    pub total_count: u64,
}

/// One entry of a repository's event feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// The event subtype that records a new star.
pub const WATCH_EVENT: &str = "WatchEvent";

/// A file returned by the contents endpoint, base64-encoded.
#[derive(Debug, Deserialize)]
pub struct ContentFile {
    #[serde(default)]
    pub content: String,
}
