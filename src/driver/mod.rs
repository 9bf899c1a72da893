//! Browser driver capability
//!
//! The crawler never talks to the network itself. Everything it needs from a
//! rendered page goes through the [`Driver`] trait:
//! - Navigation with a bounded wait
//! - Snapshots of the rendered DOM
//! - Element lookup by selector or by exact trimmed text
//! - Clicks and scrolling
//!
//! Two implementations are provided: [`ChromiumDriver`] drives a real
//! Chromium over the DevTools protocol, and [`FixtureDriver`] serves canned
//! HTML screens for tests and offline replays.

mod chromium;
mod fixture;
mod session;
mod wait;

pub use chromium::{ChromiumDriver, ChromiumLauncher};
pub use fixture::{FixtureDriver, FixtureElement, FixtureEvent, FixtureLauncher, FixtureSite};
pub use session::Session;
pub use wait::{wait_for, Probe, Settler};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a driver implementation
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u128 },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("No page is loaded")]
    NoPage,
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// One browser page, driven strictly sequentially
#[async_trait]
pub trait Driver: Send + Sync {
    /// Handle to an element of the current page
    type Element: Send + Sync;

    /// Loads `url`, failing if it is not ready within `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> DriverResult<()>;

    /// Serialized HTML of the page as currently rendered
    async fn content(&self) -> DriverResult<String>;

    /// Every element matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Self::Element>>;

    /// Trimmed text content of an element
    async fn text(&self, element: &Self::Element) -> DriverResult<String>;

    async fn click(&self, element: &Self::Element) -> DriverResult<()>;

    async fn scroll_to_bottom(&self) -> DriverResult<()>;

    /// Elements matching `selector` whose trimmed text equals `text`
    async fn query_by_text(&self, selector: &str, text: &str) -> DriverResult<Vec<Self::Element>> {
        let mut matches = Vec::new();
        for element in self.query_all(selector).await? {
            if self.text(&element).await?.trim() == text {
                matches.push(element);
            }
        }
        Ok(matches)
    }

    /// Releases the page and its browser
    async fn close(self) -> DriverResult<()>
    where
        Self: Sized;
}

/// Starts a fresh browser session
///
/// The orchestrator launches one session per pass and closes it when the
/// pass ends, whatever its outcome.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Driver: Driver;

    async fn launch(&self) -> DriverResult<Self::Driver>;
}
