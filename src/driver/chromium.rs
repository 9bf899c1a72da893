//! Chromium DevTools driver
//!
//! Launches one Chromium process per session with a single page, using
//! chromiumoxide. The CDP event handler runs on its own task for the
//! lifetime of the session.

use crate::config::BrowserConfig;
use crate::driver::{Driver, DriverError, DriverResult, SessionLauncher};
use async_trait::async_trait;
use chromiumoxide::{Browser, Element, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

// textContent also covers elements inside collapsed panels
const TEXT_CONTENT: &str = "function() { return this.textContent; }";

fn protocol_error(e: impl std::fmt::Display) -> DriverError {
    DriverError::Protocol(e.to_string())
}

/// Launches headless (or headed) Chromium sessions
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: BrowserConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn cdp_config(&self) -> DriverResult<chromiumoxide::BrowserConfig> {
        let mut builder = chromiumoxide::BrowserConfig::builder()
            .window_size(self.config.window_width, self.config.window_height);

        if !self.config.headless {
            builder = builder.with_head();
        }
        if self.config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = &self.config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(DriverError::Launch)
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    type Driver = ChromiumDriver;

    async fn launch(&self) -> DriverResult<ChromiumDriver> {
        tracing::info!(
            "Launching browser (headless: {}, window: {}x{})",
            self.config.headless,
            self.config.window_width,
            self.config.window_height
        );

        let (browser, mut handler) = Browser::launch(self.cdp_config()?)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        Ok(ChromiumDriver {
            browser,
            page,
            handler,
        })
    }
}

/// A single Chromium page
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

#[async_trait]
impl Driver for ChromiumDriver {
    type Element = Element;

    async fn navigate(&self, url: &str, timeout: Duration) -> DriverResult<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(DriverError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(DriverError::Timeout {
                operation: format!("Navigation to {}", url),
                timeout_ms: timeout.as_millis(),
            }),
        }
    }

    async fn content(&self) -> DriverResult<String> {
        self.page.content().await.map_err(protocol_error)
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Element>> {
        self.page.find_elements(selector).await.map_err(protocol_error)
    }

    async fn text(&self, element: &Element) -> DriverResult<String> {
        let returns = element
            .call_js_fn(TEXT_CONTENT, false)
            .await
            .map_err(protocol_error)?;
        let text = returns
            .result
            .value
            .as_ref()
            .and_then(|value| value.as_str())
            .unwrap_or_default();
        Ok(text.trim().to_string())
    }

    async fn click(&self, element: &Element) -> DriverResult<()> {
        element.click().await.map_err(protocol_error)?;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> DriverResult<()> {
        self.page
            .evaluate(SCROLL_TO_BOTTOM)
            .await
            .map_err(protocol_error)?;
        Ok(())
    }

    async fn close(self) -> DriverResult<()> {
        let Self {
            mut browser,
            page,
            handler,
        } = self;
        drop(page);

        let closed = browser.close().await.map_err(protocol_error);
        if let Err(e) = browser.wait().await {
            tracing::debug!("Browser process did not exit cleanly: {}", e);
        }
        handler.abort();

        closed.map(|_| ())
    }
}
