//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::storage::{CatalogRow, ProductRecord, VariantRecord};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unexpected header in {path}: {found}")]
    HeaderMismatch { path: String, found: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// Rows are append-only: nothing is rewritten or deleted during a run. Every
/// append must be durable before it returns, because callers mark the URL
/// as seen immediately afterwards.
pub trait RecordStore: Send {
    /// Creates the store with its header if absent; no-op otherwise
    fn ensure_initialized(&mut self) -> StorageResult<()>;

    /// Returns the URL of every stored row, of either shape
    ///
    /// A store that does not exist yet yields an empty set.
    fn load_seen_urls(&self) -> StorageResult<HashSet<String>>;

    /// Appends a product row with empty size and price
    fn append_product_stub(&mut self, record: &ProductRecord) -> StorageResult<()>;

    /// Appends one variant row
    fn append_variant(&mut self, record: &VariantRecord) -> StorageResult<()>;

    /// Reads every row in insertion order, duplicates included
    fn read_all_rows(&self) -> StorageResult<Vec<CatalogRow>>;
}
