//! Crawl orchestration
//!
//! A run is two passes, each in its own browser session:
//! - Discovery: read the category menu from the catalog page, then walk
//!   every category listing, recording and visiting unseen products
//! - Revisit: open every stored product row again with the visit-only
//!   (or, if configured, recording) detail workflow
//!
//! The session of a pass is closed when the pass ends, whatever its outcome.

use crate::config::Config;
use crate::crawler::detail::{DetailMode, ProductDetailWorkflow};
use crate::crawler::extractor::{discover_categories, Category};
use crate::crawler::paginator::CategoryPaginator;
use crate::driver::{Driver, Probe, Session, SessionLauncher};
use crate::output::CrawlReport;
use crate::state::SeenUrls;
use crate::storage::{CatalogRow, ProductRecord, RecordStore};
use crate::{CrawlError, Result};
use std::collections::HashSet;
use url::Url;

/// Main crawl orchestrator
pub struct Orchestrator<L: SessionLauncher, S: RecordStore> {
    config: Config,
    launcher: L,
    store: S,
    seen: SeenUrls,
    base_url: Url,
}

impl<L: SessionLauncher, S: RecordStore> Orchestrator<L, S> {
    /// Creates an orchestrator, initializing `store` and loading its URLs
    ///
    /// # Arguments
    ///
    /// * `config` - Validated crawl configuration
    /// * `launcher` - Starts the browser session of each pass
    /// * `store` - Record store; created with its header if absent
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run, with the seen set rebuilt
    /// * `Err(CrawlError)` - The store could not be initialized or read
    pub fn new(config: Config, launcher: L, mut store: S) -> Result<Self> {
        let base_url = Url::parse(&config.site.base_url)?;

        store.ensure_initialized()?;
        let seen = SeenUrls::from(store.load_seen_urls()?);

        Ok(Self {
            config,
            launcher,
            store,
            seen,
            base_url,
        })
    }

    pub fn seen(&self) -> &SeenUrls {
        &self.seen
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the discovery pass, then the revisit pass if enabled
    ///
    /// Category and product failures are logged and counted in the report.
    /// An error is returned only if a pass cannot start at all: the browser
    /// does not launch, the catalog page or its navigation menu does not
    /// load, or the store cannot be read for the revisit.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        let mut report = CrawlReport::new();
        tracing::info!("Starting crawl of {}", self.config.site.catalog_url);

        self.run_discovery_pass(&mut report).await?;

        if self.config.revisit.enabled {
            self.run_revisit_pass(&mut report).await?;
        } else {
            tracing::info!("Revisit pass disabled");
        }

        report.finish();
        report.log_summary();
        Ok(report)
    }

    async fn run_discovery_pass(&mut self, report: &mut CrawlReport) -> Result<()> {
        let driver = self.launcher.launch().await?;
        let result = self.discover_and_walk(&driver, report).await;
        close_session(driver).await;
        result
    }

    async fn discover_and_walk(
        &mut self,
        driver: &L::Driver,
        report: &mut CrawlReport,
    ) -> Result<()> {
        let session = Session::new(driver, &self.config.timing);
        let categories = load_categories(&session, &self.config, &self.base_url).await?;
        report.categories_discovered = categories.len();

        for category in &categories {
            let mut paginator = CategoryPaginator::new(&session, &self.config, &self.base_url);
            match paginator
                .run(category, &mut self.store, &mut self.seen)
                .await
            {
                Ok(outcome) => {
                    tracing::info!("Processed category: {}", category.name);
                    report.record_category(&outcome);
                }
                Err(e) => {
                    tracing::error!("Error processing category {}: {}", category.name, e);
                    report.categories_failed += 1;
                }
            }
        }

        Ok(())
    }

    async fn run_revisit_pass(&mut self, report: &mut CrawlReport) -> Result<()> {
        let rows = revisit_targets(self.store.read_all_rows()?, self.config.revisit.dedupe);
        tracing::info!("Revisiting {} stored product row(s)", rows.len());

        let driver = self.launcher.launch().await?;
        let result = self.revisit_rows(&driver, &rows, report).await;
        close_session(driver).await;
        result
    }

    async fn revisit_rows(
        &mut self,
        driver: &L::Driver,
        rows: &[CatalogRow],
        report: &mut CrawlReport,
    ) -> Result<()> {
        let session = Session::new(driver, &self.config.timing);
        let mode = DetailMode::revisit(self.config.revisit.record_variants);

        for row in rows {
            if row.url.is_empty() {
                continue;
            }
            tracing::info!("Revisiting product: {} -> {}", row.product_name, row.url);

            let product = ProductRecord {
                category: row.category.clone(),
                product_name: row.product_name.clone(),
                url: row.url.clone(),
            };
            let mut workflow = ProductDetailWorkflow::new(&session, &self.config.selectors, mode);
            match workflow.run(&product, &mut self.store).await {
                Ok(outcome) => {
                    report.revisits += 1;
                    report.variants_recorded += outcome.variants;
                }
                Err(e) => {
                    tracing::error!("Error revisiting product {}: {}", row.url, e);
                    report.revisit_failures += 1;
                }
            }
        }

        Ok(())
    }
}

/// Opens the catalog page and reads its category menu
async fn load_categories<D: Driver>(
    session: &Session<'_, D>,
    config: &Config,
    base_url: &Url,
) -> Result<Vec<Category>> {
    let catalog_url = &config.site.catalog_url;
    tracing::info!("Navigating to catalog page {}", catalog_url);
    session
        .goto(catalog_url, config.timing.settle_after_navigate)
        .await?;

    let menu = session
        .wait_for(
            Probe::Selector(&config.selectors.navigation_menu),
            config.timing.navigation_menu_timeout(),
        )
        .await?;
    if menu.is_none() {
        return Err(CrawlError::NavigationMenuMissing {
            url: catalog_url.clone(),
        });
    }

    let html = session.driver().content().await?;
    let categories = discover_categories(&html, base_url, &config.selectors)?;
    tracing::info!("Discovered {} categories", categories.len());
    Ok(categories)
}

/// Stored rows to revisit, in file order
///
/// Without `dedupe` every row is visited, so a product with N variant rows
/// is opened N + 1 times.
fn revisit_targets(rows: Vec<CatalogRow>, dedupe: bool) -> Vec<CatalogRow> {
    if !dedupe {
        return rows;
    }
    let mut visited = HashSet::new();
    rows.into_iter()
        .filter(|row| visited.insert(row.url.clone()))
        .collect()
}

async fn close_session<D: Driver>(driver: D) {
    if let Err(e) = driver.close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(url: &str, size: &str) -> CatalogRow {
        CatalogRow {
            category: "Mugs".to_string(),
            product_name: "Mug".to_string(),
            url: url.to_string(),
            size: size.to_string(),
            price: String::new(),
        }
    }

    #[test]
    fn test_revisit_targets_keep_duplicates_by_default() {
        let rows = vec![row("a", ""), row("a", "S"), row("b", "")];
        assert_eq!(revisit_targets(rows, false).len(), 3);
    }

    #[test]
    fn test_revisit_targets_dedupe_keeps_first() {
        let rows = vec![row("a", ""), row("b", ""), row("a", "S")];
        let targets = revisit_targets(rows, true);
        let urls: Vec<&str> = targets.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b"]);
        assert_eq!(targets[0].size, "");
    }
}
