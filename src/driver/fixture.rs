//! In-memory fixture driver
//!
//! A fixture site is a set of named HTML screens. Navigating to a URL shows
//! the screen registered under that URL. Clicking an element whose nearest
//! `data-goto` attribute (on itself or an ancestor) names another screen
//! switches to that screen; other clicks change nothing. A URL may name a
//! different screen for every navigation after its first. Every launch,
//! navigation, click, scroll and close is appended to a journal shared by
//! all sessions of a launcher.

use crate::driver::{Driver, DriverError, DriverResult, SessionLauncher};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Something a fixture session did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureEvent {
    Launch,
    Navigate(String),
    Click { screen: String, text: String },
    Scroll,
    Close,
}

/// Named HTML screens making up a fake site
#[derive(Debug, Clone, Default)]
pub struct FixtureSite {
    screens: HashMap<String, String>,
    reloads: HashMap<String, String>,
    unreachable: HashSet<String>,
}

impl FixtureSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `html` under `id`, which is a URL for navigable screens
    pub fn with_screen(mut self, id: impl Into<String>, html: impl Into<String>) -> Self {
        self.screens.insert(id.into(), html.into());
        self
    }

    /// Shows screen `id` instead of `url`'s own on every later visit to `url`
    pub fn with_reload(mut self, url: impl Into<String>, id: impl Into<String>) -> Self {
        self.reloads.insert(url.into(), id.into());
        self
    }

    /// Makes navigation to `url` fail even if a screen is registered
    pub fn with_unreachable(mut self, url: impl Into<String>) -> Self {
        self.unreachable.insert(url.into());
        self
    }

    fn screen(&self, id: &str) -> Option<&str> {
        self.screens.get(id).map(String::as_str)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Launches fixture sessions that share one journal
#[derive(Debug, Clone)]
pub struct FixtureLauncher {
    site: Arc<FixtureSite>,
    journal: Arc<Mutex<Vec<FixtureEvent>>>,
}

impl FixtureLauncher {
    pub fn new(site: FixtureSite) -> Self {
        Self {
            site: Arc::new(site),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Everything recorded so far, in order
    pub fn journal(&self) -> Vec<FixtureEvent> {
        lock(&self.journal).clone()
    }

    /// URLs navigated to, in order
    pub fn navigations(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter_map(|event| match event {
                FixtureEvent::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    /// Text of every clicked element, in order
    pub fn clicks(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter_map(|event| match event {
                FixtureEvent::Click { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SessionLauncher for FixtureLauncher {
    type Driver = FixtureDriver;

    async fn launch(&self) -> DriverResult<FixtureDriver> {
        lock(&self.journal).push(FixtureEvent::Launch);
        Ok(FixtureDriver {
            site: Arc::clone(&self.site),
            current: Mutex::new(None),
            visited: Mutex::new(HashSet::new()),
            journal: Arc::clone(&self.journal),
        })
    }
}

/// Handle to an element of a fixture screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureElement {
    screen: String,
    text: String,
    goto: Option<String>,
}

impl FixtureElement {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A single fixture page
#[derive(Debug)]
pub struct FixtureDriver {
    site: Arc<FixtureSite>,
    current: Mutex<Option<String>>,
    visited: Mutex<HashSet<String>>,
    journal: Arc<Mutex<Vec<FixtureEvent>>>,
}

impl FixtureDriver {
    fn record(&self, event: FixtureEvent) {
        lock(&self.journal).push(event);
    }

    fn current_screen(&self) -> DriverResult<(String, String)> {
        let current = lock(&self.current).clone().ok_or(DriverError::NoPage)?;
        let html = self
            .site
            .screen(&current)
            .ok_or_else(|| DriverError::Protocol(format!("unknown screen '{}'", current)))?;
        Ok((current, html.to_string()))
    }
}

/// Runs `css` against `html`, resolving each match's text and click target
fn select(screen: &str, html: &str, css: &str) -> DriverResult<Vec<FixtureElement>> {
    let selector = Selector::parse(css)
        .map_err(|e| DriverError::InvalidSelector(format!("{}: {:?}", css, e)))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .map(|element| FixtureElement {
            screen: screen.to_string(),
            text: element.text().collect::<String>().trim().to_string(),
            goto: click_target(element),
        })
        .collect())
}

fn click_target(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("data-goto")
        .or_else(|| {
            element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find_map(|ancestor| ancestor.value().attr("data-goto"))
        })
        .map(str::to_string)
}

#[async_trait]
impl Driver for FixtureDriver {
    type Element = FixtureElement;

    async fn navigate(&self, url: &str, _timeout: Duration) -> DriverResult<()> {
        self.record(FixtureEvent::Navigate(url.to_string()));

        if self.site.unreachable.contains(url) || self.site.screen(url).is_none() {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                message: "no such fixture page".to_string(),
            });
        }

        let revisit = !lock(&self.visited).insert(url.to_string());
        let screen = match self.site.reloads.get(url) {
            Some(reload) if revisit => reload.clone(),
            _ => url.to_string(),
        };
        *lock(&self.current) = Some(screen);
        Ok(())
    }

    async fn content(&self) -> DriverResult<String> {
        self.current_screen().map(|(_, html)| html)
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<FixtureElement>> {
        let (screen, html) = self.current_screen()?;
        select(&screen, &html, selector)
    }

    async fn text(&self, element: &FixtureElement) -> DriverResult<String> {
        Ok(element.text.clone())
    }

    async fn click(&self, element: &FixtureElement) -> DriverResult<()> {
        self.record(FixtureEvent::Click {
            screen: element.screen.clone(),
            text: element.text.clone(),
        });

        if let Some(target) = &element.goto {
            if self.site.screen(target).is_none() {
                return Err(DriverError::Protocol(format!(
                    "click target '{}' is not a fixture screen",
                    target
                )));
            }
            *lock(&self.current) = Some(target.clone());
        }

        Ok(())
    }

    async fn scroll_to_bottom(&self) -> DriverResult<()> {
        self.current_screen()?;
        self.record(FixtureEvent::Scroll);
        Ok(())
    }

    async fn close(self) -> DriverResult<()> {
        self.record(FixtureEvent::Close);
        Ok(())
    }
}
