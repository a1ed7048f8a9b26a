//! Top-level crawl loop and run context.
//!
//! A [`Crawler`] owns every piece of run state: the budgeted client, the
//! walker, the in-memory catalog, and the persistence paths. Whatever way
//! the loop exits, checkpoint and catalog are persisted before the run
//! returns.

use std::path::PathBuf;

use tracing::{error, info};

use crate::catalog::Catalog;
use crate::crawl::RepoWalker;
use crate::enrich::{self, EnrichOptions};
use crate::github::GitHubClient;
use crate::store::{Checkpoint, save_catalog};

/// Counters summarizing one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Pages yielded by the walker.
    pub pages: usize,
    /// Candidates seen across all pages.
    pub candidates: usize,
    /// Entries newly added to the catalog.
    pub enriched: usize,
    /// Candidates skipped because their id was already cataloged.
    pub skipped_known: usize,
    /// Candidates skipped because their details were unavailable.
    pub skipped_unavailable: usize,
    /// Outbound API calls spent.
    pub requests_used: u32,
}

/// One crawl run: walker-driven discovery, per-candidate enrichment, and
/// guaranteed persistence on exit.
pub struct Crawler {
    client: GitHubClient,
    walker: Box<dyn RepoWalker>,
    catalog: Catalog,
    checkpoint_path: PathBuf,
    output_path: PathBuf,
    options: EnrichOptions,
    report: RunReport,
}

impl Crawler {
    pub fn new(
        client: GitHubClient,
        walker: Box<dyn RepoWalker>,
        catalog: Catalog,
        checkpoint_path: PathBuf,
        output_path: PathBuf,
        options: EnrichOptions,
    ) -> Self {
        Self {
            client,
            walker,
            catalog,
            checkpoint_path,
            output_path,
            options,
            report: RunReport::default(),
        }
    }

    /// Run the crawl to completion (or until the budget is exhausted) and
    /// persist progress.
    ///
    /// Persistence happens on every exit path; a mid-run fatal error still
    /// saves the last committed cursor and the catalog accumulated so far.
    pub async fn run(mut self) -> RunReport {
        let outcome = self.crawl_loop().await;
        if let Err(e) = outcome {
            error!(error = %e, "crawl aborted; persisting progress");
        }

        let checkpoint = Checkpoint::new(self.walker.cursor());
        if let Err(e) = checkpoint.save(&self.checkpoint_path) {
            error!(path = %self.checkpoint_path.display(), error = %e, "checkpoint save failed");
        }
        if let Err(e) = save_catalog(&self.catalog, &self.output_path) {
            error!(path = %self.output_path.display(), error = %e, "catalog save failed");
        }

        self.report.requests_used = self.client.budget().used();
        info!(
            pages = self.report.pages,
            candidates = self.report.candidates,
            enriched = self.report.enriched,
            skipped_known = self.report.skipped_known,
            skipped_unavailable = self.report.skipped_unavailable,
            requests_used = self.report.requests_used,
            "run finished"
        );
        self.report
    }

    async fn crawl_loop(&mut self) -> Result<(), crate::github::GitHubError> {
        while let Some(page) = self.walker.next_page(&self.client).await? {
            self.report.pages += 1;

            for candidate in &page {
                self.report.candidates += 1;

                if self.catalog.contains(candidate.id) {
                    self.report.skipped_known += 1;
                    continue;
                }

                match enrich::process(&self.client, candidate, &self.options).await? {
                    Some(entry) => {
                        self.catalog.insert(entry);
                        self.report.enriched += 1;
                    }
                    None => self.report.skipped_unavailable += 1,
                }
            }

            // The page (or day) completed without fatal error: only now may
            // the cursor move.
            self.walker.commit();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::budget::RequestBudget;
    use crate::crawl::IdOffsetWalker;
    use crate::github::api_url;
    use crate::http::MockTransport;
    use crate::pacing::RequestPacer;
    use crate::store::load_catalog_seed;

    fn client_with(mock: &MockTransport, limit: u32) -> GitHubClient {
        GitHubClient::new_with_transport(
            "test-token",
            Arc::new(RequestBudget::new(limit)),
            RequestPacer::unthrottled(),
            Arc::new(mock.clone()),
        )
    }

    fn listing_url(since: u64) -> String {
        api_url("/repositories", &[("since", since.to_string())]).unwrap()
    }

    fn details_json(id: u64, full_name: &str) -> String {
        format!(
            r#"{{
                "id": {id},
                "full_name": "{full_name}",
                "html_url": "https://github.com/{full_name}",
                "description": null,
                "language": "Rust",
                "topics": [],
                "stargazers_count": 1,
                "size": 1,
                "default_branch": "main",
                "clone_url": null,
                "updated_at": null,
                "pushed_at": null
            }}"#
        )
    }

    #[tokio::test]
    async fn budget_exhaustion_still_persists_the_committed_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint_path = dir.path().join("progress.json");
        let output_path = dir.path().join("projects.json");

        let mock = MockTransport::new();
        mock.push_json(listing_url(0), r#"[{"id": 5, "full_name": "a/a"}]"#);
        mock.push_json(api_url("/repos/a/a", &[]).unwrap(), &details_json(5, "a/a"));
        // Page 2 would list from id 5, but the budget dies first.
        mock.push_json(listing_url(5), r#"[{"id": 6, "full_name": "b/b"}]"#);

        // Budget: listing + details + contributors + issues + events +
        // 5 readme candidates = 10, then the second listing call fails.
        let client = client_with(&mock, 10);
        let crawler = Crawler::new(
            client,
            Box::new(IdOffsetWalker::new(0)),
            Catalog::new(),
            checkpoint_path.clone(),
            output_path.clone(),
            EnrichOptions::default(),
        );

        let report = crawler.run().await;
        assert_eq!(report.enriched, 1);
        assert_eq!(report.requests_used, 10);

        // The first page was committed before the fatal error.
        let checkpoint = Checkpoint::load_or(
            &checkpoint_path,
            crate::crawl::Cursor::RepoId { last_repo_id: 999 },
        );
        assert_eq!(
            checkpoint.cursor,
            crate::crawl::Cursor::RepoId { last_repo_id: 5 }
        );

        let catalog = load_catalog_seed(&output_path);
        assert!(catalog.contains(5));
    }

    #[tokio::test]
    async fn known_ids_are_not_reprocessed() {
        let dir = tempfile::tempdir().unwrap();

        let mock = MockTransport::new();
        mock.push_json(listing_url(0), r#"[{"id": 7, "full_name": "c/c"}]"#);
        mock.push_json(listing_url(7), "[]");

        let client = client_with(&mock, 100);
        let seeded: Catalog = [crate::catalog::entry_fixture(7, 1.0)].into_iter().collect();
        let crawler = Crawler::new(
            client,
            Box::new(IdOffsetWalker::new(0)),
            seeded,
            dir.path().join("progress.json"),
            dir.path().join("projects.json"),
            EnrichOptions::default(),
        );

        let report = crawler.run().await;
        assert_eq!(report.skipped_known, 1);
        assert_eq!(report.enriched, 0);
        // Two listing calls, no enrichment fetches.
        assert_eq!(report.requests_used, 2);

        let catalog = load_catalog_seed(&dir.path().join("projects.json"));
        assert_eq!(catalog.len(), 1);
    }
}
