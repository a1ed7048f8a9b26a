//! Gitscout - an incremental GitHub crawl-and-enrichment pipeline.
//!
//! Gitscout walks public GitHub repositories under a per-run request budget,
//! enriches each new candidate with demand signals (recent open issues,
//! recent stars, contributors, keywords, optionally code lines), and
//! maintains a growing JSON catalog ordered by demand. A checkpoint file
//! makes every run resumable from where the previous one stopped.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gitscout::{
//!     Catalog, Crawler, DateSearchOptions, DateSearchWalker, EnrichOptions,
//!     GitHubClient, RequestBudget, RequestPacer,
//! };
//!
//! let budget = Arc::new(RequestBudget::new(2000));
//! let client = GitHubClient::new(&token, budget, RequestPacer::new(1))?;
//! let walker = DateSearchWalker::new(origin, today, DateSearchOptions::default());
//!
//! let report = Crawler::new(
//!     client,
//!     Box::new(walker),
//!     Catalog::new(),
//!     "progress.json".into(),
//!     "projects.json".into(),
//!     EnrichOptions::default(),
//! )
//! .run()
//! .await;
//! ```

pub mod budget;
pub mod catalog;
pub mod crawl;
pub mod enrich;
pub mod github;
pub mod http;
pub mod pacing;
pub mod run;
pub mod store;

pub use budget::{BudgetExhausted, RequestBudget};
pub use catalog::{Catalog, CatalogEntry};
pub use crawl::{Cursor, DateSearchOptions, DateSearchWalker, IdOffsetWalker, RepoWalker};
pub use enrich::{EnrichOptions, LocOptions};
pub use github::{GitHubClient, GitHubError};
pub use pacing::RequestPacer;
pub use run::{Crawler, RunReport};
pub use store::{Checkpoint, load_catalog_seed, save_catalog};
