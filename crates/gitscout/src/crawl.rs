//! Cursor-driven pagination over candidate repositories.
//!
//! Two walker strategies exist: an ID-offset walk of the full repository
//! listing, and a date-bucketed search scan. Both speak the same
//! [`RepoWalker`] contract: yield finite pages, expose the last fully
//! committed cursor, and advance that cursor only when told a unit (page or
//! day) was processed without fatal error.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::github::{FetchResult, GitHubClient, GitHubError, RepoSummary};

/// Search pagination is capped upstream at 1000 results per query.
const MAX_SEARCH_PAGES: u32 = 10;

/// Opaque resumption point for a pagination strategy.
///
/// Monotonically non-decreasing across a successful run. The field names
/// mirror the two checkpoint schemas this tool reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cursor {
    /// Numeric repository-id low-water-mark (ID-offset strategy).
    RepoId { last_repo_id: u64 },
    /// Last fully completed calendar day (date-bucketed strategy).
    Day { last_day: NaiveDate },
}

/// Produces a lazy sequence of candidate repositories, finite per call,
/// restartable via a cursor.
#[async_trait]
pub trait RepoWalker: Send {
    /// Fetch the next page of candidates, or `None` when the walk is done.
    async fn next_page(
        &mut self,
        client: &GitHubClient,
    ) -> Result<Option<Vec<RepoSummary>>, GitHubError>;

    /// The last committed cursor. Never regresses.
    fn cursor(&self) -> Cursor;

    /// Mark the most recently yielded page as fully processed.
    fn commit(&mut self);
}

/// Walks `/repositories` by repository-id low-water-mark.
///
/// Terminates on the first empty page; commit advances the mark to the
/// maximum id seen in the processed page.
pub struct IdOffsetWalker {
    since: u64,
    pending: Option<u64>,
}

impl IdOffsetWalker {
    pub fn new(since: u64) -> Self {
        Self {
            since,
            pending: None,
        }
    }

    /// Resume from a checkpoint cursor; a cursor of the wrong kind is
    /// treated as absent.
    pub fn from_cursor(cursor: Cursor) -> Self {
        match cursor {
            Cursor::RepoId { last_repo_id } => Self::new(last_repo_id),
            Cursor::Day { .. } => {
                tracing::warn!("checkpoint cursor is date-based; restarting id walk from 0");
                Self::new(0)
            }
        }
    }
}

#[async_trait]
impl RepoWalker for IdOffsetWalker {
    async fn next_page(
        &mut self,
        client: &GitHubClient,
    ) -> Result<Option<Vec<RepoSummary>>, GitHubError> {
        let page = client.list_repositories(self.since).await?;
        if page.is_empty() {
            self.pending = None;
            return Ok(None);
        }

        let max_id = page.iter().map(|r| r.id).max().unwrap_or(self.since);
        self.pending = Some(max_id.max(self.since));
        Ok(Some(page))
    }

    fn cursor(&self) -> Cursor {
        Cursor::RepoId {
            last_repo_id: self.since,
        }
    }

    fn commit(&mut self) {
        if let Some(mark) = self.pending.take() {
            self.since = mark;
        }
    }
}

/// Filters applied to each day's search query.
#[derive(Debug, Clone)]
pub struct DateSearchOptions {
    /// Minimum star count for a candidate.
    pub min_stars: u32,
    /// Only candidates pushed within this trailing window (days).
    pub pushed_within_days: i64,
    /// Requested page size; a shorter page exhausts the day.
    pub per_page: u32,
}

impl Default for DateSearchOptions {
    fn default() -> Self {
        Self {
            min_stars: 50,
            pushed_within_days: 30,
            per_page: 100,
        }
    }
}

/// Walks repository search results one calendar day at a time.
///
/// Pages within a day advance on commit; a page shorter than the requested
/// size exhausts the day, and the next commit moves the cursor to that day
/// and the scan to the following one. The walk ends past `today`.
pub struct DateSearchWalker {
    /// Last fully completed day; the persisted cursor.
    committed: NaiveDate,
    /// Day currently being scanned.
    day: NaiveDate,
    page: u32,
    day_exhausted: bool,
    today: NaiveDate,
    options: DateSearchOptions,
}

impl DateSearchWalker {
    pub fn new(last_completed: NaiveDate, today: NaiveDate, options: DateSearchOptions) -> Self {
        Self {
            committed: last_completed,
            day: next_day(last_completed),
            page: 1,
            day_exhausted: false,
            today,
            options,
        }
    }

    /// Resume from a checkpoint cursor; a cursor of the wrong kind is
    /// treated as absent and the walk restarts at `origin`.
    pub fn from_cursor(
        cursor: Cursor,
        origin: NaiveDate,
        today: NaiveDate,
        options: DateSearchOptions,
    ) -> Self {
        match cursor {
            Cursor::Day { last_day } => Self::new(last_day, today, options),
            Cursor::RepoId { .. } => {
                tracing::warn!(
                    origin = %origin,
                    "checkpoint cursor is id-based; restarting date walk from origin"
                );
                Self::new(origin, today, options)
            }
        }
    }

    fn query(&self) -> String {
        let pushed_after = self.today - chrono::Duration::days(self.options.pushed_within_days);
        format!(
            "created:{} stars:>={} pushed:>{}",
            self.day, self.options.min_stars, pushed_after
        )
    }
}

#[async_trait]
impl RepoWalker for DateSearchWalker {
    async fn next_page(
        &mut self,
        client: &GitHubClient,
    ) -> Result<Option<Vec<RepoSummary>>, GitHubError> {
        if self.day > self.today {
            return Ok(None);
        }

        if self.page > MAX_SEARCH_PAGES {
            self.day_exhausted = true;
            return Ok(Some(Vec::new()));
        }

        let page = match client
            .search_repositories(&self.query(), self.page, self.options.per_page)
            .await?
        {
            FetchResult::Fetched { data, .. } => data,
            FetchResult::Missing { reason } => {
                // A page the search could not serve must not complete the
                // day: end the walk with the cursor still on the last day
                // that actually finished, so the next run retries this one.
                tracing::warn!(
                    day = %self.day,
                    page = self.page,
                    %reason,
                    "search unavailable; stopping without completing the day"
                );
                self.day_exhausted = false;
                return Ok(None);
            }
        };

        self.day_exhausted = (page.len() as u32) < self.options.per_page;
        Ok(Some(page))
    }

    fn cursor(&self) -> Cursor {
        Cursor::Day {
            last_day: self.committed,
        }
    }

    fn commit(&mut self) {
        if self.day_exhausted {
            self.committed = self.day;
            self.day = next_day(self.day);
            self.page = 1;
            self.day_exhausted = false;
        } else {
            self.page += 1;
        }
    }
}

fn next_day(day: NaiveDate) -> NaiveDate {
    day.succ_opt().unwrap_or(NaiveDate::MAX)
}
