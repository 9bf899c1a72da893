//! State module for tracking crawl progress
//!
//! This module provides the explicit state machines that drive a crawl and the
//! dedup set that makes it resumable.
//!
//! # Components
//!
//! - `PaginationState`: Phases of one category's listing traversal
//! - `DetailState`: Phases of one product's provider/variant extraction
//! - `SeenUrls`: Product URLs already present in the record store

mod detail_state;
mod pagination_state;
mod seen_urls;

// Re-export main types
pub use detail_state::DetailState;
pub use pagination_state::{PaginationState, Termination};
pub use seen_urls::SeenUrls;
