//! Enrichment of one candidate repository into a catalog entry.
//!
//! The aggregator fans out to the client's sub-fetches and never lets a
//! failed fetch abort the record: each field degrades to a safe default
//! (zero or empty). Only budget exhaustion escapes this boundary.

mod keywords;
mod loc;
mod stars;

pub use keywords::classify;
pub use loc::{LocOptions, count_code_lines, count_lines_in_tree};
pub use stars::count_stars_since;

use chrono::Utc;
use tracing::{debug, info};

use crate::catalog::CatalogEntry;
use crate::github::{FetchResult, GitHubClient, GitHubError, RepoSummary};

/// Knobs for the enrichment of a single repository.
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Trailing window, in days, for issue and star growth.
    pub window_days: i64,
    /// Whether to run the optional code-line-count step.
    pub count_lines: bool,
    pub loc: LocOptions,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            window_days: 30,
            count_lines: false,
            loc: LocOptions::default(),
        }
    }
}

/// Demand index: recent open-issue growth per recent star gained.
///
/// With no new stars the raw issue count stands in; division by zero is
/// impossible.
pub fn demand_index(new_stars: u64, new_open_issues: u64) -> f64 {
    if new_stars > 0 {
        new_open_issues as f64 / new_stars as f64
    } else {
        new_open_issues as f64
    }
}

/// Enrich one candidate into a catalog entry.
///
/// Returns `Ok(None)` when the repository's details are unavailable; the
/// candidate is skipped without further fetches. Every other sub-fetch
/// failure degrades its field instead of aborting the record.
pub async fn process(
    client: &GitHubClient,
    candidate: &RepoSummary,
    options: &EnrichOptions,
) -> Result<Option<CatalogEntry>, GitHubError> {
    info!(repo = %candidate.full_name, "enriching repository");

    let details = match client.get_repo(&candidate.full_name).await? {
        FetchResult::Fetched { data, .. } => data,
        FetchResult::Missing { reason } => {
            debug!(repo = %candidate.full_name, %reason, "repository details unavailable; skipping");
            return Ok(None);
        }
    };

    let contributors = client.contributors_count(&details.full_name).await?;
    let new_open_issues = client
        .recent_open_issues_count(&details.full_name, options.window_days)
        .await?;

    let window_start = Utc::now() - chrono::Duration::days(options.window_days);
    let new_stars = count_stars_since(client, &details.full_name, window_start).await?;

    let readme = client.get_readme(&details.full_name).await?;
    let keywords = classify(
        &details.topics,
        details.description.as_deref(),
        &readme,
        details.language.as_deref(),
    );

    let code_lines = if options.count_lines {
        Some(count_code_lines(&details, &options.loc).await)
    } else {
        None
    };

    Ok(Some(CatalogEntry {
        id: details.id,
        name: details.full_name,
        url: details.html_url,
        stars: details.stargazers_count,
        language: details.language,
        keywords,
        new_open_issues,
        new_stars,
        contributors,
        code_lines,
        demand_index: demand_index(new_stars, new_open_issues),
        last_updated_repo: details.updated_at,
        last_pushed_repo: details.pushed_at,
        date_fetched: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::budget::RequestBudget;
    use crate::github::api_url;
    use crate::http::MockTransport;
    use crate::pacing::RequestPacer;

    #[test]
    fn demand_index_never_divides_by_zero() {
        assert_eq!(demand_index(0, 7), 7.0);
        assert_eq!(demand_index(0, 0), 0.0);
        assert_eq!(demand_index(4, 2), 0.5);
        assert_eq!(demand_index(2, 10), 5.0);
    }

    fn client_with(mock: &MockTransport) -> GitHubClient {
        GitHubClient::new_with_transport(
            "test-token",
            Arc::new(RequestBudget::new(100)),
            RequestPacer::unthrottled(),
            Arc::new(mock.clone()),
        )
    }

    /// Register the issue-search response for the current window boundary.
    ///
    /// Also registers the boundary one day earlier so a date flip mid-test
    /// cannot fail the lookup.
    fn mock_issue_search(mock: &MockTransport, full_name: &str, days: i64, body: &str) {
        for offset in [days, days + 1] {
            let date = (Utc::now() - chrono::Duration::days(offset))
                .format("%Y-%m-%d")
                .to_string();
            let query = format!("repo:{full_name} is:issue is:open created:>{date}");
            let url = api_url(
                "/search/issues",
                &[("q", query), ("per_page", "1".to_string())],
            )
            .unwrap();
            mock.push_json(url, body);
        }
    }

    #[tokio::test]
    async fn missing_details_skip_the_candidate() {
        let mock = MockTransport::new();
        let client = client_with(&mock);

        let candidate = RepoSummary {
            id: 1,
            full_name: "octo/cat".to_string(),
        };
        let entry = process(&client, &candidate, &EnrichOptions::default())
            .await
            .unwrap();
        assert!(entry.is_none());
        // Only the details fetch was attempted.
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn sub_fetch_failures_degrade_to_defaults() {
        let mock = MockTransport::new();
        mock.push_json(
            api_url("/repos/octo/cat", &[]).unwrap(),
            r#"{
                "id": 11,
                "full_name": "octo/cat",
                "html_url": "https://github.com/octo/cat",
                "description": "a terminal tool",
                "language": "Rust",
                "topics": [],
                "stargazers_count": 123,
                "size": 10,
                "default_branch": "main",
                "clone_url": "https://github.com/octo/cat.git",
                "updated_at": "2026-08-01T00:00:00Z",
                "pushed_at": "2026-08-02T00:00:00Z"
            }"#,
        );
        // Everything else is unregistered: contributors, issues, events and
        // readme all degrade.

        let client = client_with(&mock);
        let candidate = RepoSummary {
            id: 11,
            full_name: "octo/cat".to_string(),
        };
        let entry = process(&client, &candidate, &EnrichOptions::default())
            .await
            .unwrap()
            .expect("details resolved, so the entry must be produced");

        assert_eq!(entry.id, 11);
        assert_eq!(entry.stars, 123);
        assert_eq!(entry.contributors, 0);
        assert_eq!(entry.new_open_issues, 0);
        assert_eq!(entry.new_stars, 0);
        assert_eq!(entry.demand_index, 0.0);
        assert_eq!(entry.code_lines, None);
        // Description tokens still classify.
        assert_eq!(entry.keywords, vec!["CLI", "Tool"]);
    }

    #[tokio::test]
    async fn derived_fields_come_from_the_sub_fetches() {
        let mock = MockTransport::new();
        mock.push_json(
            api_url("/repos/octo/cat", &[]).unwrap(),
            r#"{
                "id": 11,
                "full_name": "octo/cat",
                "html_url": "https://github.com/octo/cat",
                "description": null,
                "language": "Rust",
                "topics": ["react"],
                "stargazers_count": 5,
                "size": 10,
                "default_branch": "main",
                "clone_url": null,
                "updated_at": null,
                "pushed_at": null
            }"#,
        );
        mock.push_json(
            api_url(
                "/repos/octo/cat/contributors",
                &[("per_page", "1".to_string()), ("anon", "true".to_string())],
            )
            .unwrap(),
            "[{}]",
        );
        mock_issue_search(&mock, "octo/cat", 30, r#"{"total_count": 6}"#);
        mock.push_json(
            api_url(
                "/repos/octo/cat/events",
                &[("per_page", "100".to_string()), ("page", "1".to_string())],
            )
            .unwrap(),
            r#"[
                {"type": "WatchEvent", "created_at": "2099-01-01T00:00:00Z"},
                {"type": "WatchEvent", "created_at": "2099-01-01T00:00:00Z"},
                {"type": "WatchEvent", "created_at": "2099-01-01T00:00:00Z"}
            ]"#,
        );

        let client = client_with(&mock);
        let candidate = RepoSummary {
            id: 11,
            full_name: "octo/cat".to_string(),
        };
        let entry = process(&client, &candidate, &EnrichOptions::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(entry.contributors, 1);
        assert_eq!(entry.new_open_issues, 6);
        assert_eq!(entry.new_stars, 3);
        assert_eq!(entry.demand_index, 2.0);
        assert_eq!(entry.keywords, vec!["Web"]);
    }
}
