//! Per-run outbound request budget.
//!
//! Explicit state owned by the run context and shared into the API client,
//! so independent runs and tests never cross-contaminate.

use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;

/// The run's request ceiling was reached.
///
/// This is fatal for the current run, not a retryable condition: the run
/// loop unwinds, persists progress, and the process exits normally.
#[derive(Debug, Error)]
#[error("request budget exhausted after {used} of {limit} requests")]
pub struct BudgetExhausted {
    pub used: u32,
    pub limit: u32,
}

/// Counter of outbound API calls made during the current run.
///
/// Reset only by constructing a new budget; incremented by every outbound
/// call; checked before each call; never decremented.
#[derive(Debug)]
pub struct RequestBudget {
    limit: u32,
    used: AtomicU32,
}

impl RequestBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: AtomicU32::new(0),
        }
    }

    /// Reserve one request, or fail if the ceiling is reached.
    ///
    /// A failed acquire does not increment the counter.
    pub fn try_acquire(&self) -> Result<(), BudgetExhausted> {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .map(|_| ())
            .map_err(|used| BudgetExhausted {
                used,
                limit: self.limit,
            })
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}
