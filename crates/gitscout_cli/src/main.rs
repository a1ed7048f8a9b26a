//! Gitscout CLI - crawl GitHub and maintain a demand-ranked project catalog.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use gitscout::crawl::{DateSearchOptions, DateSearchWalker, IdOffsetWalker, RepoWalker};
use gitscout::enrich::{EnrichOptions, LocOptions};
use gitscout::store::{Checkpoint, load_catalog_seed};
use gitscout::{Crawler, Cursor, GitHubClient, RequestBudget, RequestPacer};

/// Default request ceiling for the date-bucketed strategy.
const DEFAULT_BUDGET_DAYS: u32 = 2000;
/// Default request ceiling for the ID-offset strategy.
const DEFAULT_BUDGET_IDS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Search repositories one creation day at a time (default).
    Days,
    /// Walk all public repositories by id offset.
    Ids,
}

#[derive(Parser, Debug)]
#[command(name = "gitscout")]
#[command(version)]
#[command(about = "Crawl GitHub repositories and rank them by demand signals")]
#[command(after_long_help = r#"EXAMPLES
    Crawl repositories created since a given day:
        $ gitscout --origin-day 2026-01-01

    Resume the previous crawl (reads progress.json):
        $ gitscout

    Walk all public repositories by id with a small budget:
        $ gitscout --strategy ids --max-requests 50

    Include the shallow-clone line count step:
        $ gitscout --count-lines

ENVIRONMENT VARIABLES
    GITSCOUT_TOKEN    GitHub API token (GH_TOKEN is honored as a fallback)
"#)]
struct Cli {
    /// Catalog output file.
    #[arg(long, default_value = "projects.json")]
    output: PathBuf,

    /// Crawl progress checkpoint file.
    #[arg(long, default_value = "progress.json")]
    checkpoint: PathBuf,

    /// GitHub API token (falls back to GITSCOUT_TOKEN, then GH_TOKEN).
    #[arg(long)]
    token: Option<String>,

    /// Pagination strategy.
    #[arg(long, value_enum, default_value_t = Strategy::Days)]
    strategy: Strategy,

    /// Request ceiling for this run (default: 2000 for days, 100 for ids).
    #[arg(long)]
    max_requests: Option<u32>,

    /// Minimum star count for date-bucketed search candidates.
    #[arg(long, default_value_t = 50)]
    min_stars: u32,

    /// Trailing window, in days, for issue and star growth (also bounds the
    /// pushed-recently search filter).
    #[arg(long, default_value_t = 30)]
    days: i64,

    /// Count source lines via a transient shallow clone.
    #[arg(long)]
    count_lines: bool,

    /// First creation day to scan when no checkpoint exists (days strategy).
    #[arg(long)]
    origin_day: Option<NaiveDate>,

    /// Outbound request pacing.
    #[arg(long, default_value_t = gitscout::pacing::DEFAULT_RPS)]
    requests_per_second: u32,

    /// Scratch directory for shallow clones.
    #[arg(long, default_value = ".")]
    scratch_dir: PathBuf,
}

impl Cli {
    fn budget_limit(&self) -> u32 {
        self.max_requests.unwrap_or(match self.strategy {
            Strategy::Days => DEFAULT_BUDGET_DAYS,
            Strategy::Ids => DEFAULT_BUDGET_IDS,
        })
    }

    fn build_walker(&self, checkpoint: Checkpoint) -> Box<dyn RepoWalker> {
        match self.strategy {
            Strategy::Ids => Box::new(IdOffsetWalker::from_cursor(checkpoint.cursor)),
            Strategy::Days => {
                let today = Utc::now().date_naive();
                let origin = self
                    .origin_day
                    .unwrap_or_else(|| today - chrono::Duration::days(self.days));
                let options = DateSearchOptions {
                    min_stars: self.min_stars,
                    pushed_within_days: self.days,
                    ..DateSearchOptions::default()
                };
                Box::new(DateSearchWalker::from_cursor(
                    checkpoint.cursor,
                    origin,
                    today,
                    options,
                ))
            }
        }
    }

    fn origin_cursor(&self) -> Cursor {
        match self.strategy {
            Strategy::Ids => Cursor::RepoId { last_repo_id: 0 },
            Strategy::Days => {
                let today = Utc::now().date_naive();
                Cursor::Day {
                    last_day: self
                        .origin_day
                        .unwrap_or_else(|| today - chrono::Duration::days(self.days)),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("gitscout=info,gitscout_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // The only fatal configuration error; everything downstream degrades.
    let token = config::resolve_token(cli.token.clone())?;

    let budget = Arc::new(RequestBudget::new(cli.budget_limit()));
    let pacer = RequestPacer::new(cli.requests_per_second);
    let client = GitHubClient::new(&token, Arc::clone(&budget), pacer)?;

    let checkpoint = Checkpoint::load_or(&cli.checkpoint, cli.origin_cursor());
    let walker = cli.build_walker(checkpoint);
    let catalog = load_catalog_seed(&cli.output);

    let options = EnrichOptions {
        window_days: cli.days,
        count_lines: cli.count_lines,
        loc: LocOptions {
            scratch_root: cli.scratch_dir.clone(),
            ..LocOptions::default()
        },
    };

    let crawler = Crawler::new(
        client,
        walker,
        catalog,
        cli.checkpoint.clone(),
        cli.output.clone(),
        options,
    );

    // Run failures were already logged and progress persisted; the process
    // still exits cleanly so schedulers rerun it on the next tick.
    let report = crawler.run().await;
    tracing::info!(
        enriched = report.enriched,
        requests_used = report.requests_used,
        output = %cli.output.display(),
        "done"
    );

    Ok(())
}
