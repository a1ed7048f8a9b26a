//! GitHub API integration.
//!
//! The client enforces the per-run request budget and fixed pacing, and
//! translates every transport or HTTP failure into an explicit
//! [`FetchResult::Missing`] so the enrichment layer can degrade fields
//! instead of aborting records.

mod client;
mod error;
mod types;

pub use client::{FetchResult, GitHubClient, PaginationInfo, parse_link_header};
#[cfg(test)]
pub(crate) use client::api_url;
pub use error::{GitHubError, MissingReason};
pub use types::{ContentFile, Event, RepoDetails, RepoSummary, SearchIssues, SearchRepos, WATCH_EVENT};
