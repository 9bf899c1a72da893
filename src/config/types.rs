use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub revisit: RevisitConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// The single target site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Origin used to resolve relative hrefs (e.g. "https://printify.com")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Page carrying the category navigation menu
    #[serde(rename = "catalog-url")]
    pub catalog_url: String,
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,

    #[serde(rename = "no-sandbox")]
    pub no_sandbox: bool,

    #[serde(rename = "window-width")]
    pub window_width: u32,

    #[serde(rename = "window-height")]
    pub window_height: u32,

    /// Explicit Chromium binary; auto-detected when absent
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: true,
            window_width: 1280,
            window_height: 800,
            chrome_executable: None,
        }
    }
}

/// How a settle wait decides the page has finished reacting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettleStrategy {
    /// Sleep for the whole settle duration
    Fixed,
    /// Poll the rendered DOM until two consecutive snapshots match,
    /// giving up after the settle duration
    Stable,
}

/// Waits and timeouts, all in milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    #[serde(rename = "navigation-timeout")]
    pub navigation_timeout: u64,

    #[serde(rename = "navigation-menu-timeout")]
    pub navigation_menu_timeout: u64,

    /// Bounded wait for optional controls (choose-manually, panels, size)
    #[serde(rename = "control-timeout")]
    pub control_timeout: u64,

    /// Bounded wait for the provider popup's close control
    #[serde(rename = "close-timeout")]
    pub close_timeout: u64,

    #[serde(rename = "poll-interval")]
    pub poll_interval: u64,

    #[serde(rename = "settle-strategy")]
    pub settle_strategy: SettleStrategy,

    #[serde(rename = "settle-after-navigate")]
    pub settle_after_navigate: u64,

    #[serde(rename = "settle-after-scroll")]
    pub settle_after_scroll: u64,

    #[serde(rename = "settle-after-click")]
    pub settle_after_click: u64,

    #[serde(rename = "settle-after-close")]
    pub settle_after_close: u64,

    #[serde(rename = "settle-after-page-turn")]
    pub settle_after_page_turn: u64,

    #[serde(rename = "settle-after-return")]
    pub settle_after_return: u64,

    /// Pause at the end of each revisited product
    #[serde(rename = "revisit-linger")]
    pub revisit_linger: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: 60_000,
            navigation_menu_timeout: 30_000,
            control_timeout: 5_000,
            close_timeout: 3_000,
            poll_interval: 100,
            settle_strategy: SettleStrategy::Fixed,
            settle_after_navigate: 2_000,
            settle_after_scroll: 2_000,
            settle_after_click: 1_000,
            settle_after_close: 500,
            settle_after_page_turn: 2_000,
            settle_after_return: 1_000,
            revisit_linger: 2_000,
        }
    }
}

impl TimingConfig {
    /// A configuration with no settle pauses and near-zero timeouts
    pub fn immediate() -> Self {
        Self {
            navigation_timeout: 1_000,
            navigation_menu_timeout: 0,
            control_timeout: 0,
            close_timeout: 0,
            poll_interval: 1,
            settle_strategy: SettleStrategy::Fixed,
            settle_after_navigate: 0,
            settle_after_scroll: 0,
            settle_after_click: 0,
            settle_after_close: 0,
            settle_after_page_turn: 0,
            settle_after_return: 0,
            revisit_linger: 0,
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout)
    }

    pub fn navigation_menu_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_menu_timeout)
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV record store
    #[serde(rename = "csv-path")]
    pub csv_path: String,
}

/// Second pass over every stored product row
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RevisitConfig {
    pub enabled: bool,

    /// Harvest and append variant rows while revisiting
    #[serde(rename = "record-variants")]
    pub record_variants: bool,

    /// Visit each stored URL once instead of once per row
    pub dedupe: bool,
}

impl Default for RevisitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            record_variants: false,
            dedupe: false,
        }
    }
}

/// Markup bindings for the target site
///
/// Every field is a CSS selector except the `*_label` / `*_text` fields,
/// which are matched against trimmed element text.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    pub navigation_menu: String,
    pub category_link: String,
    pub product_link: String,
    pub product_name: String,
    pub choose_manually: String,
    pub choose_manually_text: String,
    pub panel: String,
    pub panel_button: String,
    pub provider_button: String,
    pub provider_info_label: String,
    pub size_label: String,
    pub variants_table: String,
    pub variant_row: String,
    pub variant_size: String,
    pub variant_price: String,
    pub close_control: String,
    pub next_disabled: String,
    pub next_enabled: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            navigation_menu: ".nav".to_string(),
            category_link: ".nav a[href^=\"/app/products\"]".to_string(),
            product_link: "a.wrapper-link".to_string(),
            product_name: "p[data-testid=\"blueprintName\"]".to_string(),
            choose_manually: "button[data-testid=\"chipButton\"]".to_string(),
            choose_manually_text: "Choose manually".to_string(),
            panel: ".custom-content".to_string(),
            panel_button: ".custom-content button".to_string(),
            provider_button: "pfy-button[data-testid=\"moreDetailsButton\"] button".to_string(),
            provider_info_label: "Provider info".to_string(),
            size_label: "Size".to_string(),
            variants_table: "pfy-variants-table[data-testid=\"variantsTable\"]".to_string(),
            variant_row: "pfy-variants-table-title-row".to_string(),
            variant_size:
                "td.selected-option pfy-variants-table-column-text [data-testid=\"columnText\"]"
                    .to_string(),
            variant_price: "span[data-testid=\"standardPrice\"]".to_string(),
            close_control: "i.material-icons[title=\"Close\"]".to_string(),
            next_disabled:
                "pfy-button.disabled button[disabled] pfy-icon[name=\"chevron_right\"]".to_string(),
            next_enabled: "button:not([disabled]) pfy-icon[name=\"chevron_right\"]".to_string(),
        }
    }
}

impl SelectorConfig {
    /// Every CSS selector field paired with its config key
    pub fn css_selectors(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("navigation-menu", &self.navigation_menu),
            ("category-link", &self.category_link),
            ("product-link", &self.product_link),
            ("product-name", &self.product_name),
            ("choose-manually", &self.choose_manually),
            ("panel", &self.panel),
            ("panel-button", &self.panel_button),
            ("provider-button", &self.provider_button),
            ("variants-table", &self.variants_table),
            ("variant-row", &self.variant_row),
            ("variant-size", &self.variant_size),
            ("variant-price", &self.variant_price),
            ("close-control", &self.close_control),
            ("next-disabled", &self.next_disabled),
            ("next-enabled", &self.next_enabled),
        ]
    }
}
