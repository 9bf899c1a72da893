//! Catalog-Crawl: a resumable product catalog crawler
//!
//! This crate discovers product categories from a site's navigation menu,
//! paginates through every category listing, appends newly seen products to
//! a CSV record store and drills into each product's provider/size/price
//! tables. Progress is derived from the store itself, so an interrupted run
//! resumes without re-processing products it already recorded.

pub mod config;
pub mod crawler;
pub mod driver;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Catalog-Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Driver error: {0}")]
    Driver(#[from] driver::DriverError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Navigation menu did not appear on {url}")]
    NavigationMenuMissing { url: String },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("Could not return to listing page {page} after visiting a product")]
    PositionLost { page: u32 },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Catalog-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Orchestrator};
pub use state::{DetailState, PaginationState, SeenUrls};
pub use storage::{CsvRecordStore, RecordStore};
