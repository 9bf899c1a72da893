//! Product detail workflow
//!
//! Drives one product page through its provider popups:
//!
//! ```text
//! Arrive -> Configure -> Providers -> (Open -> SelectSizeView -> Harvest -> Close)* -> Finished
//! ```
//!
//! In visit-only mode every provider trigger is clicked in one batch and the
//! size view is opened once, without harvesting.

use crate::config::{SelectorConfig, TimingConfig};
use crate::crawler::extractor::extract_variants;
use crate::driver::{Driver, Probe, Session};
use crate::state::DetailState;
use crate::storage::{ProductRecord, RecordStore, VariantRecord};
use crate::{CrawlError, Result};
use std::time::Duration;

/// How provider popups are opened on a product page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderTrigger {
    /// Dedicated provider buttons
    Button,

    /// Panel elements whose text is the provider-info label
    PanelText,
}

/// Options for one run of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailMode {
    pub trigger: ProviderTrigger,

    /// Harvest and persist variants for each provider
    pub record_variants: bool,
}

impl DetailMode {
    /// Mode used while walking category listings
    pub fn discovery() -> Self {
        Self {
            trigger: ProviderTrigger::Button,
            record_variants: true,
        }
    }

    /// Mode used by the revisit pass
    pub fn revisit(record_variants: bool) -> Self {
        Self {
            trigger: ProviderTrigger::PanelText,
            record_variants,
        }
    }
}

/// What happened on one product page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailOutcome {
    /// Whether the manual-configuration chip was found and clicked
    pub configured: bool,
    pub providers: usize,
    pub variants: usize,

    /// Providers whose popup could not be closed
    pub unclosed_popups: usize,
}

/// Provider/size/price extraction for a single product page
///
/// The workflow leaves the browser on the product page; returning to the
/// listing is the caller's concern.
pub struct ProductDetailWorkflow<'s, 'a, D: Driver> {
    session: &'s Session<'a, D>,
    selectors: &'s SelectorConfig,
    mode: DetailMode,
    state: DetailState,
}

impl<'s, 'a, D: Driver> ProductDetailWorkflow<'s, 'a, D> {
    pub fn new(session: &'s Session<'a, D>, selectors: &'s SelectorConfig, mode: DetailMode) -> Self {
        Self {
            session,
            selectors,
            mode,
            state: DetailState::Arrive,
        }
    }

    pub fn state(&self) -> DetailState {
        self.state
    }

    fn timing(&self) -> &'a TimingConfig {
        self.session.timing()
    }

    fn transition(&mut self, next: DetailState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state.as_str(),
                to: next.as_str(),
            });
        }
        tracing::debug!("Detail workflow: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the workflow for `product`, appending harvested variants to `store`
    ///
    /// # Returns
    ///
    /// * `Ok(DetailOutcome)` - The page was processed; individual popup
    ///   failures are counted rather than raised
    /// * `Err(CrawlError)` - The page could not be loaded or a provider popup
    ///   could not be driven
    pub async fn run(
        &mut self,
        product: &ProductRecord,
        store: &mut dyn RecordStore,
    ) -> Result<DetailOutcome> {
        self.state = DetailState::Arrive;
        let mut outcome = DetailOutcome::default();

        self.session
            .goto(&product.url, self.timing().settle_after_navigate)
            .await?;
        tracing::info!("[Visited] {}", product.url);

        self.transition(DetailState::Configure)?;
        outcome.configured = match self.configure().await {
            Ok(configured) => configured,
            Err(e) => {
                tracing::warn!("Configuration step failed on {}: {}", product.url, e);
                false
            }
        };

        self.transition(DetailState::Providers)?;
        let triggers = self.find_triggers().await?;
        outcome.providers = triggers.len();
        tracing::info!("Found {} provider trigger(s) on {}", triggers.len(), product.url);

        if !triggers.is_empty() {
            if self.mode.record_variants {
                self.harvest_each(&triggers, product, store, &mut outcome)
                    .await?;
            } else {
                self.open_all(&triggers).await?;
            }
        }

        self.transition(DetailState::Finished)?;
        Ok(outcome)
    }

    /// Switches the page into manual configuration if it offers it
    async fn configure(&self) -> Result<bool> {
        let driver = self.session.driver();
        let timing = self.timing();

        let Some(chips) = self
            .session
            .wait_for(
                Probe::Selector(&self.selectors.choose_manually),
                timing.control_timeout(),
            )
            .await?
        else {
            tracing::info!("No \"{}\" control on this page", self.selectors.choose_manually_text);
            return Ok(false);
        };

        for chip in &chips {
            if !driver
                .text(chip)
                .await?
                .contains(&self.selectors.choose_manually_text)
            {
                continue;
            }

            self.session.click(chip, timing.settle_after_click).await?;
            tracing::info!("Clicked \"{}\"", self.selectors.choose_manually_text);

            let panel = self
                .session
                .wait_for(Probe::Selector(&self.selectors.panel), timing.control_timeout())
                .await?;
            if panel.is_none() {
                tracing::info!("Configuration panel did not appear");
                return Ok(true);
            }

            let buttons = driver.query_all(&self.selectors.panel_button).await?;
            for button in &buttons {
                self.session.click(button, timing.settle_after_click).await?;
            }
            tracing::debug!("Clicked {} configuration panel button(s)", buttons.len());
            return Ok(true);
        }

        tracing::info!(
            "No control labelled \"{}\" on this page",
            self.selectors.choose_manually_text
        );
        Ok(false)
    }

    async fn find_triggers(&self) -> Result<Vec<D::Element>> {
        let driver = self.session.driver();
        let triggers = match self.mode.trigger {
            ProviderTrigger::Button => driver.query_all(&self.selectors.provider_button).await?,
            ProviderTrigger::PanelText => {
                driver
                    .query_by_text(&self.selectors.panel, &self.selectors.provider_info_label)
                    .await?
            }
        };
        Ok(triggers)
    }

    async fn harvest_each(
        &mut self,
        triggers: &[D::Element],
        product: &ProductRecord,
        store: &mut dyn RecordStore,
        outcome: &mut DetailOutcome,
    ) -> Result<()> {
        let settle_after_click = self.timing().settle_after_click;

        for (index, trigger) in triggers.iter().enumerate() {
            let provider = index + 1;

            self.transition(DetailState::Open)?;
            tracing::info!("Opening provider #{}", provider);
            self.session.click(trigger, settle_after_click).await?;

            self.transition(DetailState::SelectSizeView)?;
            let size_views = self.select_size_view(Duration::ZERO).await?;
            if size_views == 0 {
                tracing::debug!("No size view for provider #{}", provider);
            }

            self.transition(DetailState::Harvest)?;
            outcome.variants += self.harvest(provider, product, store).await?;

            self.transition(DetailState::Close)?;
            if !self.close_popup(provider).await {
                outcome.unclosed_popups += 1;
            }
        }

        Ok(())
    }

    /// Clicks every element of the panel labelled with the size label
    ///
    /// Returns how many were clicked.
    async fn select_size_view(&self, timeout: Duration) -> Result<usize> {
        let probe = Probe::Text {
            selector: &self.selectors.panel,
            text: &self.selectors.size_label,
        };
        let Some(views) = self.session.wait_for(probe, timeout).await? else {
            return Ok(0);
        };

        for view in &views {
            self.session.driver().click(view).await?;
        }
        self.session.settle(self.timing().settle_after_click).await?;
        Ok(views.len())
    }

    async fn harvest(
        &self,
        provider: usize,
        product: &ProductRecord,
        store: &mut dyn RecordStore,
    ) -> Result<usize> {
        let html = self.session.driver().content().await?;

        let Some(variants) = extract_variants(&html, self.selectors)? else {
            tracing::info!("No variants table for provider #{}", provider);
            return Ok(0);
        };

        for variant in &variants {
            store.append_variant(&VariantRecord {
                category: product.category.clone(),
                product_name: product.product_name.clone(),
                url: product.url.clone(),
                size: variant.size.clone(),
                price: variant.price.clone(),
            })?;
            tracing::info!(
                "[Variant] {} | {} -> {}",
                product.product_name,
                variant.size,
                variant.price
            );
        }

        Ok(variants.len())
    }

    /// Dismisses the provider popup; failure is logged, never raised
    async fn close_popup(&self, provider: usize) -> bool {
        let timing = self.timing();
        let probe = Probe::Selector(&self.selectors.close_control);

        let controls = match self.session.wait_for(probe, timing.close_timeout()).await {
            Ok(Some(controls)) => controls,
            Ok(None) => {
                tracing::warn!(
                    "Could not close provider #{}: no close control within {:?}",
                    provider,
                    timing.close_timeout()
                );
                return false;
            }
            Err(e) => {
                tracing::warn!("Could not close provider #{}: {}", provider, e);
                return false;
            }
        };

        let Some(control) = controls.first() else {
            return false;
        };
        match self.session.click(control, timing.settle_after_close).await {
            Ok(()) => {
                tracing::info!("Closed provider #{}", provider);
                true
            }
            Err(e) => {
                tracing::warn!("Could not close provider #{}: {}", provider, e);
                false
            }
        }
    }

    async fn open_all(&mut self, triggers: &[D::Element]) -> Result<()> {
        let timing = self.timing();

        self.transition(DetailState::Open)?;
        for trigger in triggers {
            self.session.driver().click(trigger).await?;
        }
        tracing::info!(
            "Clicked {} \"{}\" element(s)",
            triggers.len(),
            self.selectors.provider_info_label
        );
        self.session.settle(timing.settle_after_click).await?;

        self.transition(DetailState::SelectSizeView)?;
        match self.select_size_view(timing.control_timeout()).await {
            Ok(0) => tracing::info!("No \"{}\" element appeared", self.selectors.size_label),
            Ok(count) => tracing::info!(
                "Clicked {} \"{}\" element(s)",
                count,
                self.selectors.size_label
            ),
            Err(e) => tracing::warn!("Size view could not be opened: {}", e),
        }

        self.session.settle(timing.revisit_linger).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{FixtureLauncher, FixtureSite, SessionLauncher};
    use crate::storage::CsvRecordStore;
    use tempfile::TempDir;

    const PRODUCT_URL: &str = "https://printify.com/app/products/1/mug";

    const PRODUCT_PAGE: &str = r#"
        <pfy-chip>Choose manually</pfy-chip>
        <button data-testid="providerButton" data-goto="provider-1">Provider A</button>
        <button data-testid="providerButton" data-goto="provider-2">Provider B</button>
    "#;

    fn provider_popup(size: &str, price: &str) -> String {
        format!(
            r#"<div class="popup">
                 <div class="custom-content">Size</div>
                 <pfy-variants-table data-testid="variantsTable"><table><tr><td>
                   <pfy-variants-table-title-row><table><tr>
                     <td class="selected-option"><pfy-variants-table-column-text>
                       <span data-testid="columnText">{}</span>
                     </pfy-variants-table-column-text></td>
                     <td><span data-testid="standardPrice">{}</span></td>
                   </tr></table></pfy-variants-table-title-row>
                 </td></tr></table></pfy-variants-table>
                 <button data-testid="closeButton" data-goto="{}">x</button>
               </div>"#,
            size, price, PRODUCT_URL
        )
    }

    fn product() -> ProductRecord {
        ProductRecord {
            category: "Mugs".to_string(),
            product_name: "Mug 11oz".to_string(),
            url: PRODUCT_URL.to_string(),
        }
    }

    fn store_in(dir: &TempDir) -> CsvRecordStore {
        let mut store = CsvRecordStore::new(&dir.path().join("catalog.csv"));
        store.ensure_initialized().unwrap();
        store
    }

    fn selectors() -> SelectorConfig {
        SelectorConfig {
            provider_button: r#"button[data-testid="providerButton"]"#.to_string(),
            close_control: r#"button[data-testid="closeButton"]"#.to_string(),
            ..SelectorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_harvests_every_provider() {
        let site = FixtureSite::new()
            .with_screen(PRODUCT_URL, PRODUCT_PAGE)
            .with_screen("provider-1", provider_popup("11oz", "USD 4.50"))
            .with_screen("provider-2", provider_popup("15oz", "USD 6.10"));
        let launcher = FixtureLauncher::new(site);
        let driver = launcher.launch().await.unwrap();
        let timing = TimingConfig::immediate();
        let session = Session::new(&driver, &timing);
        let selectors = selectors();
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let mut workflow = ProductDetailWorkflow::new(&session, &selectors, DetailMode::discovery());
        let outcome = workflow.run(&product(), &mut store).await.unwrap();

        assert_eq!(outcome.providers, 2);
        assert_eq!(outcome.variants, 2);
        assert_eq!(outcome.unclosed_popups, 0);
        assert_eq!(workflow.state(), DetailState::Finished);

        let rows = store.read_all_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].size, "11oz");
        assert_eq!(rows[1].price, "USD 6.10");
    }

    #[tokio::test]
    async fn test_no_providers_writes_nothing() {
        let site = FixtureSite::new().with_screen(PRODUCT_URL, "<p>Nothing to configure</p>");
        let driver = FixtureLauncher::new(site).launch().await.unwrap();
        let timing = TimingConfig::immediate();
        let session = Session::new(&driver, &timing);
        let selectors = selectors();
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let mut workflow = ProductDetailWorkflow::new(&session, &selectors, DetailMode::discovery());
        let outcome = workflow.run(&product(), &mut store).await.unwrap();

        assert_eq!(outcome, DetailOutcome::default());
        assert!(store.read_all_rows().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_close_control_moves_on() {
        let popup = r#"<pfy-variants-table data-testid="variantsTable">
                         <pfy-variants-table-title-row>
                           <span data-testid="standardPrice">USD 9.99</span>
                         </pfy-variants-table-title-row>
                       </pfy-variants-table>"#;
        let site = FixtureSite::new()
            .with_screen(PRODUCT_URL, PRODUCT_PAGE)
            .with_screen("provider-1", popup)
            .with_screen("provider-2", popup);
        let driver = FixtureLauncher::new(site).launch().await.unwrap();
        let timing = TimingConfig::immediate();
        let session = Session::new(&driver, &timing);
        let selectors = selectors();
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let mut workflow = ProductDetailWorkflow::new(&session, &selectors, DetailMode::discovery());
        let outcome = workflow.run(&product(), &mut store).await.unwrap();

        assert_eq!(outcome.providers, 2);
        assert_eq!(outcome.unclosed_popups, 2);
        assert_eq!(outcome.variants, 2);
    }

    #[tokio::test]
    async fn test_visit_only_records_nothing() {
        let page = r#"
            <div class="custom-content" data-goto="info">Provider info</div>
        "#;
        let info = r#"<div class="custom-content">Size</div>"#;
        let site = FixtureSite::new()
            .with_screen(PRODUCT_URL, page)
            .with_screen("info", info);
        let launcher = FixtureLauncher::new(site);
        let driver = launcher.launch().await.unwrap();
        let timing = TimingConfig::immediate();
        let session = Session::new(&driver, &timing);
        let selectors = selectors();
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let mut workflow =
            ProductDetailWorkflow::new(&session, &selectors, DetailMode::revisit(false));
        let outcome = workflow.run(&product(), &mut store).await.unwrap();

        assert_eq!(outcome.providers, 1);
        assert_eq!(outcome.variants, 0);
        assert_eq!(
            launcher.clicks(),
            vec!["Provider info".to_string(), "Size".to_string()]
        );
        assert!(store.read_all_rows().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_product_fails() {
        let site = FixtureSite::new();
        let driver = FixtureLauncher::new(site).launch().await.unwrap();
        let timing = TimingConfig::immediate();
        let session = Session::new(&driver, &timing);
        let selectors = selectors();
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let mut workflow = ProductDetailWorkflow::new(&session, &selectors, DetailMode::discovery());
        let result = workflow.run(&product(), &mut store).await;
        assert!(matches!(result, Err(CrawlError::Driver(_))));
    }
}
