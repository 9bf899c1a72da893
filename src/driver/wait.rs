//! Waiting primitives
//!
//! All waits in the crawler go through [`wait_for`], which polls a probe until
//! it matches or a deadline passes, and [`Settler`], which pauses after a DOM
//! mutation until the page has (heuristically) finished reacting.

use crate::config::{SettleStrategy, TimingConfig};
use crate::driver::{Driver, DriverResult};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// What [`wait_for`] looks for
#[derive(Debug, Clone, Copy)]
pub enum Probe<'a> {
    /// Any element matching a selector
    Selector(&'a str),

    /// Elements matching a selector whose trimmed text equals `text`
    Text { selector: &'a str, text: &'a str },
}

impl std::fmt::Display for Probe<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Selector(selector) => write!(f, "{}", selector),
            Self::Text { selector, text } => write!(f, "{} with text '{}'", selector, text),
        }
    }
}

/// Polls `probe` until it matches or `timeout` elapses
///
/// The probe is always evaluated at least once, so a zero timeout is a
/// single check.
///
/// # Returns
///
/// * `Ok(Some(elements))` - The probe matched; all matches in document order
/// * `Ok(None)` - Nothing matched before the deadline
/// * `Err(DriverError)` - The driver failed while probing
pub async fn wait_for<D: Driver>(
    driver: &D,
    probe: Probe<'_>,
    timeout: Duration,
    poll_interval: Duration,
) -> DriverResult<Option<Vec<D::Element>>> {
    let deadline = Instant::now() + timeout;

    loop {
        let found = match probe {
            Probe::Selector(selector) => driver.query_all(selector).await?,
            Probe::Text { selector, text } => driver.query_by_text(selector, text).await?,
        };

        if !found.is_empty() {
            return Ok(Some(found));
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::trace!("Gave up waiting for {} after {:?}", probe, timeout);
            return Ok(None);
        }

        sleep(poll_interval.min(deadline - now)).await;
    }
}

/// Applies the configured settle strategy after navigation or clicks
#[derive(Debug, Clone, Copy)]
pub struct Settler {
    strategy: SettleStrategy,
    poll_interval: Duration,
}

impl Settler {
    pub fn new(strategy: SettleStrategy, poll_interval: Duration) -> Self {
        Self {
            strategy,
            poll_interval,
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.settle_strategy, timing.poll_interval())
    }

    /// Waits up to `millis` for the page to settle
    ///
    /// `Fixed` always waits the full duration. `Stable` returns as soon as two
    /// consecutive DOM snapshots one poll interval apart are identical.
    pub async fn settle<D: Driver>(&self, driver: &D, millis: u64) -> DriverResult<()> {
        if millis == 0 {
            return Ok(());
        }
        let limit = Duration::from_millis(millis);

        match self.strategy {
            SettleStrategy::Fixed => {
                sleep(limit).await;
            }
            SettleStrategy::Stable => {
                let deadline = Instant::now() + limit;
                let mut previous = driver.content().await?;

                loop {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::trace!("DOM still changing after {:?}", limit);
                        break;
                    }
                    sleep(self.poll_interval.min(deadline - now)).await;

                    let current = driver.content().await?;
                    if current == previous {
                        break;
                    }
                    previous = current;
                }
            }
        }

        Ok(())
    }
}
