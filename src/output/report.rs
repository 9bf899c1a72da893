//! Run report for a single crawl

use crate::crawler::CategoryOutcome;
use crate::state::Termination;
use chrono::{DateTime, Utc};

/// Counters collected over both passes of a run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    pub categories_discovered: usize,
    pub categories_completed: usize,

    /// Categories whose listing could not be opened at all
    pub categories_failed: usize,

    /// Categories that stopped on a failing page
    pub categories_cut_short: usize,

    pub pages_visited: u64,
    pub new_products: usize,
    pub skipped_products: usize,
    pub variants_recorded: usize,
    pub detail_failures: usize,

    pub revisits: usize,
    pub revisit_failures: usize,
}

impl Default for CrawlReport {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            categories_discovered: 0,
            categories_completed: 0,
            categories_failed: 0,
            categories_cut_short: 0,
            pages_visited: 0,
            new_products: 0,
            skipped_products: 0,
            variants_recorded: 0,
            detail_failures: 0,
            revisits: 0,
            revisit_failures: 0,
        }
    }

    /// Folds one finished category into the totals
    pub fn record_category(&mut self, outcome: &CategoryOutcome) {
        self.categories_completed += 1;
        if matches!(outcome.termination, Termination::PageFailed { .. }) {
            self.categories_cut_short += 1;
        }
        self.pages_visited += u64::from(outcome.pages);
        self.new_products += outcome.new_products;
        self.skipped_products += outcome.skipped;
        self.variants_recorded += outcome.variants;
        self.detail_failures += outcome.detail_failures;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Whole seconds between start and finish, if finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Crawl Summary ===");
        tracing::info!("Started: {}", self.started_at.to_rfc3339());
        if let (Some(finished), Some(seconds)) = (self.finished_at, self.duration_seconds()) {
            tracing::info!("Finished: {} ({}s)", finished.to_rfc3339(), seconds);
        }
        tracing::info!(
            "Categories: {} discovered, {} completed, {} failed, {} cut short",
            self.categories_discovered,
            self.categories_completed,
            self.categories_failed,
            self.categories_cut_short
        );
        tracing::info!("Listing pages visited: {}", self.pages_visited);
        tracing::info!(
            "Products: {} new, {} already recorded, {} detail failure(s)",
            self.new_products,
            self.skipped_products,
            self.detail_failures
        );
        tracing::info!("Variant rows recorded: {}", self.variants_recorded);
        tracing::info!(
            "Revisits: {} completed, {} failed",
            self.revisits,
            self.revisit_failures
        );
    }
}
