use crate::config::TimingConfig;
use crate::driver::wait::{wait_for, Probe, Settler};
use crate::driver::{Driver, DriverResult};
use std::time::Duration;

/// A driver paired with the timing policy of the current run
///
/// Every mutation (navigation, click, scroll) is followed by a settle wait
/// before the caller reads its effect.
pub struct Session<'a, D: Driver> {
    driver: &'a D,
    timing: &'a TimingConfig,
    settler: Settler,
}

impl<'a, D: Driver> Session<'a, D> {
    pub fn new(driver: &'a D, timing: &'a TimingConfig) -> Self {
        Self {
            driver,
            timing,
            settler: Settler::from_timing(timing),
        }
    }

    pub fn driver(&self) -> &'a D {
        self.driver
    }

    pub fn timing(&self) -> &'a TimingConfig {
        self.timing
    }

    /// Navigates with the configured navigation timeout, then settles
    pub async fn goto(&self, url: &str, settle_ms: u64) -> DriverResult<()> {
        self.driver
            .navigate(url, self.timing.navigation_timeout())
            .await?;
        self.settle(settle_ms).await
    }

    pub async fn click(&self, element: &D::Element, settle_ms: u64) -> DriverResult<()> {
        self.driver.click(element).await?;
        self.settle(settle_ms).await
    }

    pub async fn scroll_to_bottom(&self, settle_ms: u64) -> DriverResult<()> {
        self.driver.scroll_to_bottom().await?;
        self.settle(settle_ms).await
    }

    pub async fn settle(&self, millis: u64) -> DriverResult<()> {
        self.settler.settle(self.driver, millis).await
    }

    /// Polls for `probe` using the configured poll interval
    pub async fn wait_for(
        &self,
        probe: Probe<'_>,
        timeout: Duration,
    ) -> DriverResult<Option<Vec<D::Element>>> {
        wait_for(self.driver, probe, timeout, self.timing.poll_interval()).await
    }
}
