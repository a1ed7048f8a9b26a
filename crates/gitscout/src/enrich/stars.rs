//! Recent star counting via the repository event feed.

use chrono::{DateTime, Utc};

use crate::github::{FetchResult, GitHubClient, GitHubError, WATCH_EVENT};

/// The upstream event feed exposes at most 300 events (3 pages of 100).
const EVENT_FEED_PAGE_LIMIT: u32 = 3;

/// Count star events (`WatchEvent`) newer than `since`.
///
/// The feed is ordered newest-first, so the walk stops the moment an event
/// older than the window is seen, without fetching further pages. A missing
/// page degrades to the count so far.
pub async fn count_stars_since(
    client: &GitHubClient,
    full_name: &str,
    since: DateTime<Utc>,
) -> Result<u64, GitHubError> {
    let mut count = 0;

    for page in 1..=EVENT_FEED_PAGE_LIMIT {
        let (events, pagination) = match client.list_events(full_name, page).await? {
            FetchResult::Fetched { data, pagination } => (data, pagination),
            FetchResult::Missing { reason } => {
                tracing::debug!(repo = full_name, page, %reason, "event feed unavailable");
                break;
            }
        };

        if events.is_empty() {
            break;
        }

        for event in &events {
            if event.created_at < since {
                return Ok(count);
            }
            if event.kind == WATCH_EVENT {
                count += 1;
            }
        }

        if pagination.next_page.is_none() {
            break;
        }
    }

    Ok(count)
}
