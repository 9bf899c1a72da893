//! Output module for crawl reports and store statistics
//!
//! This module handles:
//! - The per-run report logged when a crawl ends
//! - Row statistics of the record store (`--stats`)

mod report;
pub mod stats;

pub use report::CrawlReport;
pub use stats::{load_statistics, print_statistics, StoreStatistics};
