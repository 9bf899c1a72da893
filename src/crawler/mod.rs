//! Crawler module for catalog traversal
//!
//! This module contains the core crawling logic, including:
//! - Snapshot extraction of categories, product stubs and variant tables
//! - Category listing pagination with dedup-gated product visits
//! - The per-product provider/size/price workflow
//! - Overall two-pass orchestration

mod detail;
mod extractor;
mod orchestrator;
mod paginator;

pub use detail::{DetailMode, DetailOutcome, ProductDetailWorkflow, ProviderTrigger};
pub use extractor::{
    discover_categories, extract_listing, extract_product_stubs, extract_variants, Category,
    HarvestedVariant,
};
pub use orchestrator::Orchestrator;
pub use paginator::{CategoryOutcome, CategoryPaginator};

use crate::config::Config;
use crate::driver::ChromiumLauncher;
use crate::output::CrawlReport;
use crate::storage::CsvRecordStore;
use crate::Result;
use std::path::Path;

/// Runs a complete crawl against a real browser
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open (or create) the CSV record store and rebuild the seen set
/// 2. Discover categories and walk every listing in one browser session
/// 3. Revisit every stored row in a second session, if enabled
/// 4. Log the run report
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed
/// * `Err(CrawlError)` - Crawl could not start or a pass could not begin
pub async fn run_crawl(config: Config) -> Result<CrawlReport> {
    let store = CsvRecordStore::new(Path::new(&config.output.csv_path));
    let launcher = ChromiumLauncher::new(config.browser.clone());

    let mut orchestrator = Orchestrator::new(config, launcher, store)?;
    orchestrator.run().await
}
