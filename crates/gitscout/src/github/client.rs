//! Rate-limited GitHub API client.
//!
//! Every outbound call goes through [`GitHubClient::get_json`], which
//! enforces the per-run request budget, applies fixed pacing, emits one
//! structured log line per call, and translates transport or HTTP failures
//! into [`FetchResult::Missing`] so higher layers can treat them as ordinary
//! empty results. Budget exhaustion is the only failure that propagates.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::budget::RequestBudget;
use crate::http::{HttpRequest, HttpResponse, HttpTransport, header_get};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::pacing::RequestPacer;

use super::error::{GitHubError, MissingReason};
use super::types::{ContentFile, Event, RepoDetails, RepoSummary, SearchIssues, SearchRepos};

const BASE_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "gitscout";
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Readme filenames tried in order when fetching repository documentation.
const README_CANDIDATES: &[&str] = &[
    "README.md",
    "README.rst",
    "README.txt",
    "readme.md",
    "README",
];

/// Pagination information extracted from the `Link` response header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationInfo {
    /// The last page number (from `rel="last"`).
    pub last_page: Option<u32>,
    /// The next page number (from `rel="next"`).
    pub next_page: Option<u32>,
}

/// Outcome of one fetch.
///
/// `Missing` carries the reason a fetch produced no data, so call sites can
/// log "fetch failed" distinctly from "legitimately zero" before degrading
/// to a default.
#[derive(Debug)]
pub enum FetchResult<T> {
    Fetched {
        data: T,
        pagination: PaginationInfo,
    },
    Missing {
        reason: MissingReason,
    },
}

impl<T> FetchResult<T> {
    /// The fetched data, discarding pagination, or `None` when missing.
    pub fn into_data(self) -> Option<T> {
        match self {
            FetchResult::Fetched { data, .. } => Some(data),
            FetchResult::Missing { .. } => None,
        }
    }
}

/// Parse the `Link` header to extract pagination info.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/repositories?since=364>; rel="next", <...&page=3>; rel="last"`
pub fn parse_link_header(link_header: &str) -> PaginationInfo {
    let mut info = PaginationInfo::default();

    for part in link_header.split(',') {
        let part = part.trim();

        let mut url = None;
        let mut rel = None;
        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        if let (Some(url), Some(rel_type)) = (url, rel)
            && let Some(page_num) = extract_page_from_url(url)
        {
            match rel_type {
                "last" => info.last_page = Some(page_num),
                "next" => info.next_page = Some(page_num),
                _ => {}
            }
        }
    }

    info
}

/// Extract the `page` query parameter from a URL.
fn extract_page_from_url(url: &str) -> Option<u32> {
    let query_start = url.find('?')?;
    let query = &url[query_start + 1..];

    for param in query.split('&') {
        if let Some(value) = param.strip_prefix("page=") {
            return value.parse().ok();
        }
    }

    None
}

/// Build a full API url with form-encoded query parameters.
pub(crate) fn api_url(path: &str, params: &[(&str, String)]) -> Result<String, GitHubError> {
    let base = format!("{BASE_URL}{path}");
    if params.is_empty() {
        return Ok(base);
    }

    let url = url::Url::parse_with_params(&base, params.iter().map(|(k, v)| (*k, v.as_str())))
        .map_err(|e| GitHubError::Url(e.to_string()))?;
    Ok(url.into())
}

/// GitHub API client with per-run request budgeting and fixed pacing.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    token: Arc<String>,
    budget: Arc<RequestBudget>,
    pacer: RequestPacer,
}

impl GitHubClient {
    /// Create a client over a real reqwest transport.
    pub fn new(
        token: &str,
        budget: Arc<RequestBudget>,
        pacer: RequestPacer,
    ) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| GitHubError::Client(e.to_string()))?;
        Ok(Self::new_with_transport(
            token,
            budget,
            pacer,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        token: &str,
        budget: Arc<RequestBudget>,
        pacer: RequestPacer,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            token: Arc::new(token.to_string()),
            budget,
            pacer,
        }
    }

    /// The budget shared with this client.
    pub fn budget(&self) -> &RequestBudget {
        &self.budget
    }

    /// Issue one budgeted, paced GET and decode the JSON body.
    ///
    /// Fails only on budget exhaustion (or an unbuildable url); every other
    /// failure is logged and returned as [`FetchResult::Missing`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<FetchResult<T>, GitHubError> {
        let url = api_url(path, params)?;

        self.budget.try_acquire()?;
        self.pacer.wait().await;

        let request = HttpRequest {
            url,
            headers: vec![
                ("Accept".to_string(), "application/vnd.github+json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.token.as_str()),
                ),
            ],
        };

        let response = match self.transport.get(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(endpoint = path, params = ?params, error = %e, "api request failed");
                return Ok(FetchResult::Missing {
                    reason: MissingReason::Transport(e.to_string()),
                });
            }
        };

        tracing::info!(
            endpoint = path,
            params = ?params,
            status = response.status,
            "api request"
        );

        self.decode(path, response)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        response: HttpResponse,
    ) -> Result<FetchResult<T>, GitHubError> {
        match response.status {
            204 => Ok(FetchResult::Missing {
                reason: MissingReason::NoContent,
            }),
            200..=299 => {
                let pagination = response
                    .header("link")
                    .map(parse_link_header)
                    .unwrap_or_default();

                match serde_json::from_slice(&response.body) {
                    Ok(data) => Ok(FetchResult::Fetched { data, pagination }),
                    Err(e) => {
                        tracing::warn!(endpoint = path, error = %e, "response body decode failed");
                        Ok(FetchResult::Missing {
                            reason: MissingReason::Decode(e.to_string()),
                        })
                    }
                }
            }
            status => {
                tracing::warn!(endpoint = path, status, "api request returned an error status");
                Ok(FetchResult::Missing {
                    reason: MissingReason::Status(status),
                })
            }
        }
    }

    /// List public repositories with an id greater than `since`.
    ///
    /// A missing result degrades to an empty page.
    pub async fn list_repositories(&self, since: u64) -> Result<Vec<RepoSummary>, GitHubError> {
        let result: FetchResult<Vec<RepoSummary>> = self
            .get_json("/repositories", &[("since", since.to_string())])
            .await?;

        match result {
            FetchResult::Fetched { data, .. } => Ok(data),
            FetchResult::Missing { reason } => {
                tracing::debug!(since, %reason, "repository listing unavailable");
                Ok(Vec::new())
            }
        }
    }

    /// Search repositories, sorted by stars descending.
    ///
    /// `Missing` is surfaced rather than flattened to an empty page: a page
    /// the search could not serve is not the same as a day with no results,
    /// and the walker must not complete a day over it.
    pub async fn search_repositories(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<FetchResult<Vec<RepoSummary>>, GitHubError> {
        let result: FetchResult<SearchRepos> = self
            .get_json(
                "/search/repositories",
                &[
                    ("q", query.to_string()),
                    ("sort", "stars".to_string()),
                    ("order", "desc".to_string()),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;

        Ok(match result {
            FetchResult::Fetched { data, pagination } => FetchResult::Fetched {
                data: data.items,
                pagination,
            },
            FetchResult::Missing { reason } => FetchResult::Missing { reason },
        })
    }

    /// Fetch full repository details.
    pub async fn get_repo(
        &self,
        full_name: &str,
    ) -> Result<FetchResult<RepoDetails>, GitHubError> {
        self.get_json(&format!("/repos/{full_name}"), &[]).await
    }

    /// Count open issues created within the trailing `days` window.
    ///
    /// Uses the issue search total; degrades to zero when the search is
    /// unavailable.
    pub async fn recent_open_issues_count(
        &self,
        full_name: &str,
        days: i64,
    ) -> Result<u64, GitHubError> {
        let date_since = issue_window_start(Utc::now(), days);
        let query = format!("repo:{full_name} is:issue is:open created:>{date_since}");

        let result: FetchResult<SearchIssues> = self
            .get_json(
                "/search/issues",
                &[("q", query), ("per_page", "1".to_string())],
            )
            .await?;

        match result {
            FetchResult::Fetched { data, .. } => Ok(data.total_count),
            FetchResult::Missing { reason } => {
                tracing::debug!(repo = full_name, %reason, "issue search unavailable");
                Ok(0)
            }
        }
    }

    /// Fetch one page of a repository's event feed (100 events per page).
    pub async fn list_events(
        &self,
        full_name: &str,
        page: u32,
    ) -> Result<FetchResult<Vec<Event>>, GitHubError> {
        self.get_json(
            &format!("/repos/{full_name}/events"),
            &[
                ("per_page", "100".to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    /// Total contributor count, including anonymous contributors.
    ///
    /// Derived from the `rel="last"` page marker of a one-per-page request
    /// when present, else the length of the returned page, else zero.
    pub async fn contributors_count(&self, full_name: &str) -> Result<u64, GitHubError> {
        let result: FetchResult<Vec<serde_json::Value>> = self
            .get_json(
                &format!("/repos/{full_name}/contributors"),
                &[
                    ("per_page", "1".to_string()),
                    ("anon", "true".to_string()),
                ],
            )
            .await?;

        match result {
            FetchResult::Fetched { data, pagination } => match pagination.last_page {
                Some(last) => Ok(u64::from(last)),
                None => Ok(data.len() as u64),
            },
            FetchResult::Missing { reason } => {
                tracing::debug!(repo = full_name, %reason, "contributor listing unavailable");
                Ok(0)
            }
        }
    }

    /// Fetch and decode one file via the contents endpoint.
    ///
    /// Returns `None` when the file is missing or its base64/UTF-8 decoding
    /// fails.
    pub async fn file_content(
        &self,
        full_name: &str,
        filename: &str,
    ) -> Result<Option<String>, GitHubError> {
        let result: FetchResult<ContentFile> = self
            .get_json(&format!("/repos/{full_name}/contents/{filename}"), &[])
            .await?;

        let Some(file) = result.into_data() else {
            return Ok(None);
        };

        // The contents API wraps base64 across lines.
        let packed: String = file.content.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = match BASE64.decode(packed.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(repo = full_name, filename, error = %e, "file content base64 decode failed");
                return Ok(None);
            }
        };

        match String::from_utf8(decoded) {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                tracing::warn!(repo = full_name, filename, error = %e, "file content is not valid utf-8");
                Ok(None)
            }
        }
    }

    /// Fetch the repository's readme, trying conventional filenames in order.
    ///
    /// Returns an empty string when none resolve.
    pub async fn get_readme(&self, full_name: &str) -> Result<String, GitHubError> {
        for candidate in README_CANDIDATES {
            if let Some(text) = self.file_content(full_name, candidate).await? {
                return Ok(text);
            }
        }
        Ok(String::new())
    }
}

/// Start of the trailing issue window as a `YYYY-MM-DD` date string.
fn issue_window_start(now: DateTime<Utc>, days: i64) -> String {
    (now - chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::RequestBudget;
    use crate::http::{HttpResponse, MockTransport};

    fn client_with(mock: &MockTransport, limit: u32) -> GitHubClient {
        GitHubClient::new_with_transport(
            "test-token",
            Arc::new(RequestBudget::new(limit)),
            RequestPacer::unthrottled(),
            Arc::new(mock.clone()),
        )
    }

    #[test]
    fn link_header_parsing_extracts_next_and_last() {
        let header = "<https://api.github.com/repos/o/r/contributors?per_page=1&page=2>; rel=\"next\", \
                      <https://api.github.com/repos/o/r/contributors?per_page=1&page=42>; rel=\"last\"";
        let info = parse_link_header(header);
        assert_eq!(info.next_page, Some(2));
        assert_eq!(info.last_page, Some(42));

        assert_eq!(parse_link_header(""), PaginationInfo::default());
    }

    #[test]
    fn api_url_encodes_query_parameters() {
        let url = api_url(
            "/search/issues",
            &[("q", "repo:a/b is:issue".to_string())],
        )
        .unwrap();
        assert!(url.starts_with("https://api.github.com/search/issues?q=repo"));
        assert!(!url.contains(' '));
    }

    #[tokio::test]
    async fn budget_exhaustion_is_fatal_and_skips_the_transport() {
        let mock = MockTransport::new();
        let client = client_with(&mock, 0);

        let err = client.get_repo("octo/cat").await.unwrap_err();
        assert!(matches!(err, GitHubError::Budget(_)));
        assert!(mock.requests().is_empty());
        assert_eq!(client.budget().used(), 0);
    }

    #[tokio::test]
    async fn contributors_count_reads_the_last_page_marker() {
        let mock = MockTransport::new();
        let url = api_url(
            "/repos/octo/cat/contributors",
            &[("per_page", "1".to_string()), ("anon", "true".to_string())],
        )
        .unwrap();
        mock.push_response(
            url,
            HttpResponse {
                status: 200,
                headers: vec![(
                    "Link".to_string(),
                    "<https://api.github.com/repos/octo/cat/contributors?per_page=1&anon=true&page=57>; rel=\"last\""
                        .to_string(),
                )],
                body: b"[{}]".to_vec(),
            },
        );

        let client = client_with(&mock, 10);
        assert_eq!(client.contributors_count("octo/cat").await.unwrap(), 57);
    }

    #[tokio::test]
    async fn contributors_count_falls_back_to_page_length_then_zero() {
        let mock = MockTransport::new();
        let url = api_url(
            "/repos/octo/cat/contributors",
            &[("per_page", "1".to_string()), ("anon", "true".to_string())],
        )
        .unwrap();

        // No Link header: the single-element page is the count.
        mock.push_json(&url, "[{}]");
        // 204 No Content: zero contributors.
        mock.push_response(
            &url,
            HttpResponse {
                status: 204,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );

        let client = client_with(&mock, 10);
        assert_eq!(client.contributors_count("octo/cat").await.unwrap(), 1);
        assert_eq!(client.contributors_count("octo/cat").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn http_failures_degrade_to_missing_not_errors() {
        let mock = MockTransport::new();
        let url = api_url("/repos/octo/cat", &[]).unwrap();
        mock.push_response(
            &url,
            HttpResponse {
                status: 502,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );

        let client = client_with(&mock, 10);
        let result = client.get_repo("octo/cat").await.unwrap();
        match result {
            FetchResult::Missing { reason } => assert_eq!(reason, MissingReason::Status(502)),
            FetchResult::Fetched { .. } => panic!("expected a missing result"),
        }

        // Unregistered url: the mock reports a transport error, which also
        // degrades rather than propagating.
        let result = client.get_repo("octo/cat").await.unwrap();
        assert!(matches!(
            result,
            FetchResult::Missing {
                reason: MissingReason::Transport(_)
            }
        ));
    }

    #[tokio::test]
    async fn readme_falls_through_candidate_filenames() {
        let mock = MockTransport::new();
        // README.md missing (404), README.rst present.
        let md = api_url("/repos/octo/cat/contents/README.md", &[]).unwrap();
        mock.push_response(
            md,
            HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );
        let rst = api_url("/repos/octo/cat/contents/README.rst", &[]).unwrap();
        let encoded = BASE64.encode("hello world");
        mock.push_json(&rst, &format!("{{\"content\": \"{encoded}\"}}"));

        let client = client_with(&mock, 10);
        assert_eq!(client.get_readme("octo/cat").await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn readme_degrades_to_empty_when_nothing_resolves() {
        let mock = MockTransport::new();
        let client = client_with(&mock, 10);
        assert_eq!(client.get_readme("octo/cat").await.unwrap(), "");
        // One request per candidate filename.
        assert_eq!(mock.requests().len(), README_CANDIDATES.len());
    }

    #[test]
    fn issue_window_start_formats_a_calendar_date() {
        let now = "2026-08-23T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(issue_window_start(now, 30), "2026-07-24");
    }
}
