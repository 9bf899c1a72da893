//! Category listing traversal
//!
//! Walks one category's listing pages in order. Each page is scrolled to its
//! end, its product stubs are read, and every stub whose URL is not yet in
//! the store is recorded and visited. Traversal ends on the last page, when
//! no next-page control can be found, or when a page fails.

use crate::config::Config;
use crate::crawler::detail::{DetailMode, ProductDetailWorkflow};
use crate::crawler::extractor::{extract_listing, Category};
use crate::driver::{Driver, Session};
use crate::state::{PaginationState, SeenUrls, Termination};
use crate::storage::{ProductRecord, ProductStub, RecordStore};
use crate::{CrawlError, Result};
use url::Url;

/// Totals for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOutcome {
    /// Listing pages processed, including a failed one
    pub pages: u32,
    pub new_products: usize,

    /// Stubs whose URL was already recorded
    pub skipped: usize,
    pub variants: usize,

    /// New products whose detail page could not be processed
    pub detail_failures: usize,
    pub termination: Termination,
}

impl Default for CategoryOutcome {
    fn default() -> Self {
        Self {
            pages: 0,
            new_products: 0,
            skipped: 0,
            variants: 0,
            detail_failures: 0,
            termination: Termination::LastPage,
        }
    }
}

enum PageStep {
    Next,
    Stop(Termination),
}

/// Listing traversal for a single category
pub struct CategoryPaginator<'s, 'a, D: Driver> {
    session: &'s Session<'a, D>,
    config: &'s Config,
    base_url: &'s Url,
    state: PaginationState,
}

impl<'s, 'a, D: Driver> CategoryPaginator<'s, 'a, D> {
    pub fn new(session: &'s Session<'a, D>, config: &'s Config, base_url: &'s Url) -> Self {
        Self {
            session,
            config,
            base_url,
            state: PaginationState::LoadingPage,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    fn transition(&mut self, next: PaginationState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state.as_str(),
                to: next.as_str(),
            });
        }
        tracing::debug!("Pagination: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Traverses every listing page of `category`
    ///
    /// A failure while loading the first page is returned as an error. Once
    /// the listing is open, a failing page ends the category with
    /// [`Termination::PageFailed`] instead.
    pub async fn run(
        &mut self,
        category: &Category,
        store: &mut dyn RecordStore,
        seen: &mut SeenUrls,
    ) -> Result<CategoryOutcome> {
        tracing::info!("Processing category: {} ({})", category.name, category.listing_url);
        self.state = PaginationState::LoadingPage;

        self.session
            .goto(
                &category.listing_url,
                self.config.timing.settle_after_navigate,
            )
            .await?;
        self.transition(PaginationState::Extracting)?;

        let mut outcome = CategoryOutcome::default();
        let mut page: u32 = 1;

        loop {
            outcome.pages = page;
            tracing::info!("Processing page {} of {}", page, category.name);

            match self.process_page(category, page, store, seen, &mut outcome).await {
                Ok(PageStep::Next) => {
                    page += 1;
                    self.transition(PaginationState::Extracting)?;
                }
                Ok(PageStep::Stop(termination)) => {
                    outcome.termination = termination;
                    break;
                }
                Err(e) => {
                    tracing::error!("Error processing page {} of {}: {}", page, category.name, e);
                    outcome.termination = Termination::PageFailed {
                        page,
                        message: e.to_string(),
                    };
                    break;
                }
            }
        }

        self.transition(PaginationState::Done)?;
        tracing::info!(
            "Finished category {}: {} page(s), {} new product(s), {} already recorded ({})",
            category.name,
            outcome.pages,
            outcome.new_products,
            outcome.skipped,
            outcome.termination
        );
        Ok(outcome)
    }

    async fn process_page(
        &mut self,
        category: &Category,
        page: u32,
        store: &mut dyn RecordStore,
        seen: &mut SeenUrls,
        outcome: &mut CategoryOutcome,
    ) -> Result<PageStep> {
        let stubs = extract_listing(
            self.session,
            self.base_url,
            &category.name,
            &self.config.selectors,
        )
        .await?;
        tracing::info!("Extracted {} product(s) from page {}", stubs.len(), page);

        for stub in &stubs {
            if stub.url.is_empty() {
                tracing::debug!("Skipping product without a link: {}", stub.product_name);
                continue;
            }
            if seen.contains(&stub.url) {
                outcome.skipped += 1;
                continue;
            }

            if self.state != PaginationState::ProcessingNewProducts {
                self.transition(PaginationState::ProcessingNewProducts)?;
            }
            self.visit_new_product(stub, store, seen, outcome).await?;
            self.return_to_listing(category, page).await?;
        }

        self.transition(PaginationState::Advancing)?;
        self.advance().await
    }

    /// Records `stub`, marks it seen, then runs the detail workflow on it
    ///
    /// Only a storage failure is returned; a failing detail page is counted
    /// and the product stays marked as seen.
    async fn visit_new_product(
        &self,
        stub: &ProductStub,
        store: &mut dyn RecordStore,
        seen: &mut SeenUrls,
        outcome: &mut CategoryOutcome,
    ) -> Result<()> {
        let record = ProductRecord::from(stub);
        store.append_product_stub(&record)?;
        seen.insert(record.url.clone());
        outcome.new_products += 1;
        tracing::info!("[Product] {} -> {}", record.product_name, record.url);

        let mut workflow =
            ProductDetailWorkflow::new(self.session, &self.config.selectors, DetailMode::discovery());
        match workflow.run(&record, store).await {
            Ok(detail) => outcome.variants += detail.variants,
            Err(e) => {
                outcome.detail_failures += 1;
                tracing::error!("Error visiting product page {}: {}", record.url, e);
                tracing::warn!(
                    "{} is recorded as seen and its variants will not be retried",
                    record.url
                );
            }
        }

        Ok(())
    }

    /// Reloads the category listing and pages forward to `page`
    async fn return_to_listing(&self, category: &Category, page: u32) -> Result<()> {
        let timing = &self.config.timing;
        self.session
            .goto(&category.listing_url, timing.settle_after_return)
            .await?;

        for _ in 1..page {
            let controls = self
                .session
                .driver()
                .query_all(&self.config.selectors.next_enabled)
                .await?;
            let Some(next) = controls.first() else {
                return Err(CrawlError::PositionLost { page });
            };
            self.session.click(next, timing.settle_after_page_turn).await?;
        }

        Ok(())
    }

    async fn advance(&self) -> Result<PageStep> {
        let driver = self.session.driver();
        let selectors = &self.config.selectors;

        if !driver.query_all(&selectors.next_disabled).await?.is_empty() {
            tracing::info!("Reached last page: next button is disabled");
            return Ok(PageStep::Stop(Termination::LastPage));
        }

        let controls = driver.query_all(&selectors.next_enabled).await?;
        let Some(next) = controls.first() else {
            tracing::warn!("Could not find an enabled next button, stopping");
            return Ok(PageStep::Stop(Termination::NoNextControl));
        };

        self.session
            .click(next, self.config.timing.settle_after_page_turn)
            .await?;
        tracing::info!("Moved to next page");
        Ok(PageStep::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputConfig, RevisitConfig, SelectorConfig, SiteConfig, TimingConfig};
    use crate::driver::{FixtureEvent, FixtureLauncher, FixtureSite, SessionLauncher};
    use crate::storage::CsvRecordStore;
    use tempfile::TempDir;

    const LISTING: &str = "https://printify.com/app/products/mugs";

    fn config() -> Config {
        Config {
            site: SiteConfig {
                base_url: "https://printify.com".to_string(),
                catalog_url: "https://printify.com/app/catalog".to_string(),
            },
            browser: Default::default(),
            timing: TimingConfig::immediate(),
            output: OutputConfig {
                csv_path: "catalog.csv".to_string(),
            },
            revisit: RevisitConfig::default(),
            selectors: SelectorConfig::default(),
        }
    }

    fn product(id: u32) -> String {
        format!(
            r#"<a class="wrapper-link" href="/app/products/{id}"><p data-testid="blueprintName">Product {id}</p></a>"#
        )
    }

    fn next_enabled(goto: &str) -> String {
        format!(
            r#"<pfy-button><button data-goto="{goto}"><pfy-icon name="chevron_right"></pfy-icon></button></pfy-button>"#
        )
    }

    const NEXT_DISABLED: &str = r#"<pfy-button class="disabled"><button disabled><pfy-icon name="chevron_right"></pfy-icon></button></pfy-button>"#;

    fn navigate(url: &str) -> FixtureEvent {
        FixtureEvent::Navigate(url.to_string())
    }

    fn click(screen: &str) -> FixtureEvent {
        FixtureEvent::Click {
            screen: screen.to_string(),
            text: String::new(),
        }
    }

    /// Navigations and clicks, without launches and scrolls
    fn moves(launcher: &FixtureLauncher) -> Vec<FixtureEvent> {
        launcher
            .journal()
            .into_iter()
            .filter(|event| {
                matches!(event, FixtureEvent::Navigate(_) | FixtureEvent::Click { .. })
            })
            .collect()
    }

    fn mugs() -> Category {
        Category {
            name: "Mugs".to_string(),
            listing_url: LISTING.to_string(),
        }
    }

    fn three_page_site() -> FixtureSite {
        FixtureSite::new()
            .with_screen(LISTING, format!("{}{}", product(1), next_enabled("page-2")))
            .with_screen("page-2", format!("{}{}", product(2), next_enabled("page-3")))
            .with_screen("page-3", format!("{}{}", product(3), NEXT_DISABLED))
            .with_screen("https://printify.com/app/products/1", "<p>one</p>")
            .with_screen("https://printify.com/app/products/2", "<p>two</p>")
            .with_screen("https://printify.com/app/products/3", "<p>three</p>")
    }

    #[tokio::test]
    async fn test_walks_until_next_is_disabled() {
        let launcher = FixtureLauncher::new(three_page_site());
        let driver = launcher.launch().await.unwrap();
        let config = config();
        let base = Url::parse(&config.site.base_url).unwrap();
        let session = Session::new(&driver, &config.timing);
        let dir = TempDir::new().unwrap();
        let mut store = CsvRecordStore::new(&dir.path().join("catalog.csv"));
        store.ensure_initialized().unwrap();
        let mut seen = SeenUrls::new();

        let mut paginator = CategoryPaginator::new(&session, &config, &base);
        let outcome = paginator.run(&mugs(), &mut store, &mut seen).await.unwrap();

        assert_eq!(outcome.pages, 3);
        assert_eq!(outcome.new_products, 3);
        assert_eq!(outcome.termination, Termination::LastPage);
        assert_eq!(paginator.state(), PaginationState::Done);
        assert_eq!(seen.len(), 3);
        assert_eq!(store.read_all_rows().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_restores_page_after_visit() {
        let launcher = FixtureLauncher::new(three_page_site());
        let driver = launcher.launch().await.unwrap();
        let config = config();
        let base = Url::parse(&config.site.base_url).unwrap();
        let session = Session::new(&driver, &config.timing);
        let dir = TempDir::new().unwrap();
        let mut store = CsvRecordStore::new(&dir.path().join("catalog.csv"));
        store.ensure_initialized().unwrap();
        let mut seen = SeenUrls::new();

        let mut paginator = CategoryPaginator::new(&session, &config, &base);
        paginator.run(&mugs(), &mut store, &mut seen).await.unwrap();

        let rows = store.read_all_rows().unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.product_name.as_str()).collect();
        assert_eq!(names, vec!["Product 1", "Product 2", "Product 3"]);

        // After each visit the listing is reloaded and paged forward again
        assert_eq!(
            moves(&launcher),
            vec![
                navigate(LISTING),
                navigate("https://printify.com/app/products/1"),
                navigate(LISTING),
                click(LISTING),
                navigate("https://printify.com/app/products/2"),
                navigate(LISTING),
                click(LISTING),
                click("page-2"),
                navigate("https://printify.com/app/products/3"),
                navigate(LISTING),
                click(LISTING),
                click("page-2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_lost_position_ends_category() {
        let site = FixtureSite::new()
            .with_screen(LISTING, format!("{}{}", product(1), next_enabled("page-2")))
            .with_screen("page-2", format!("{}{}", product(2), NEXT_DISABLED))
            .with_screen("listing-reloaded", product(1))
            .with_reload(LISTING, "listing-reloaded")
            .with_screen("https://printify.com/app/products/2", "<p>two</p>");
        let launcher = FixtureLauncher::new(site);
        let driver = launcher.launch().await.unwrap();
        let config = config();
        let base = Url::parse(&config.site.base_url).unwrap();
        let session = Session::new(&driver, &config.timing);
        let dir = TempDir::new().unwrap();
        let mut store = CsvRecordStore::new(&dir.path().join("catalog.csv"));
        store.ensure_initialized().unwrap();
        let mut seen: SeenUrls = ["https://printify.com/app/products/1".to_string()]
            .into_iter()
            .collect();

        let mut paginator = CategoryPaginator::new(&session, &config, &base);
        let outcome = paginator.run(&mugs(), &mut store, &mut seen).await.unwrap();

        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.new_products, 1);
        assert_eq!(
            outcome.termination,
            Termination::PageFailed {
                page: 2,
                message: CrawlError::PositionLost { page: 2 }.to_string(),
            }
        );
        assert_eq!(paginator.state(), PaginationState::Done);
        assert_eq!(
            moves(&launcher),
            vec![
                navigate(LISTING),
                click(LISTING),
                navigate("https://printify.com/app/products/2"),
                navigate(LISTING),
            ]
        );
    }

    #[tokio::test]
    async fn test_seen_products_are_skipped() {
        let launcher = FixtureLauncher::new(three_page_site());
        let driver = launcher.launch().await.unwrap();
        let config = config();
        let base = Url::parse(&config.site.base_url).unwrap();
        let session = Session::new(&driver, &config.timing);
        let dir = TempDir::new().unwrap();
        let mut store = CsvRecordStore::new(&dir.path().join("catalog.csv"));
        store.ensure_initialized().unwrap();
        let mut seen: SeenUrls = [
            "https://printify.com/app/products/1".to_string(),
            "https://printify.com/app/products/2".to_string(),
            "https://printify.com/app/products/3".to_string(),
        ]
        .into_iter()
        .collect();

        let mut paginator = CategoryPaginator::new(&session, &config, &base);
        let outcome = paginator.run(&mugs(), &mut store, &mut seen).await.unwrap();

        assert_eq!(outcome.new_products, 0);
        assert_eq!(outcome.skipped, 3);
        assert!(store.read_all_rows().unwrap().is_empty());
        assert_eq!(
            launcher.navigations(),
            vec![LISTING.to_string()],
            "no product page should be opened"
        );
    }

    #[tokio::test]
    async fn test_missing_next_control_stops() {
        let site = FixtureSite::new().with_screen(LISTING, "<p>Nothing listed</p>");
        let driver = FixtureLauncher::new(site).launch().await.unwrap();
        let config = config();
        let base = Url::parse(&config.site.base_url).unwrap();
        let session = Session::new(&driver, &config.timing);
        let dir = TempDir::new().unwrap();
        let mut store = CsvRecordStore::new(&dir.path().join("catalog.csv"));
        let mut seen = SeenUrls::new();

        let mut paginator = CategoryPaginator::new(&session, &config, &base);
        let outcome = paginator.run(&mugs(), &mut store, &mut seen).await.unwrap();

        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.termination, Termination::NoNextControl);
    }

    #[tokio::test]
    async fn test_unreachable_listing_is_an_error() {
        let driver = FixtureLauncher::new(FixtureSite::new()).launch().await.unwrap();
        let config = config();
        let base = Url::parse(&config.site.base_url).unwrap();
        let session = Session::new(&driver, &config.timing);
        let dir = TempDir::new().unwrap();
        let mut store = CsvRecordStore::new(&dir.path().join("catalog.csv"));
        let mut seen = SeenUrls::new();

        let mut paginator = CategoryPaginator::new(&session, &config, &base);
        assert!(paginator.run(&mugs(), &mut store, &mut seen).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_product_page_is_not_retried() {
        let site = three_page_site().with_unreachable("https://printify.com/app/products/2");
        let driver = FixtureLauncher::new(site).launch().await.unwrap();
        let config = config();
        let base = Url::parse(&config.site.base_url).unwrap();
        let session = Session::new(&driver, &config.timing);
        let dir = TempDir::new().unwrap();
        let mut store = CsvRecordStore::new(&dir.path().join("catalog.csv"));
        store.ensure_initialized().unwrap();
        let mut seen = SeenUrls::new();

        let mut paginator = CategoryPaginator::new(&session, &config, &base);
        let outcome = paginator.run(&mugs(), &mut store, &mut seen).await.unwrap();

        assert_eq!(outcome.new_products, 3);
        assert_eq!(outcome.detail_failures, 1);
        assert!(seen.contains("https://printify.com/app/products/2"));
        assert_eq!(outcome.termination, Termination::LastPage);
    }
}
