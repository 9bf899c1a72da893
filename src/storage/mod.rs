//! Storage module for persisting crawl results
//!
//! This module handles the durable record table the crawler appends to:
//! - CSV file initialization with a fixed header
//! - Append-only product stub and variant rows
//! - Rebuilding the seen-URL set on startup
//! - Reading rows back for the revisit pass and statistics

mod csv_store;
mod traits;

pub use csv_store::{CsvRecordStore, HEADER};
pub use traits::{RecordStore, StorageError, StorageResult};

use serde::Serialize;

/// Minimal product reference found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductStub {
    pub category: String,
    pub product_name: String,
    /// Absolute product URL, empty when the anchor had no href
    pub url: String,
}

/// Row written the first time a product URL is seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub category: String,
    pub product_name: String,
    pub url: String,
}

/// One (size, price) pair harvested from a provider's table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub category: String,
    pub product_name: String,
    pub url: String,
    pub size: String,
    pub price: String,
}

/// A stored row of either shape, in the store's column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    #[serde(rename = "Category")]
    pub category: String,

    #[serde(rename = "Product Name")]
    pub product_name: String,

    #[serde(rename = "Product URL")]
    pub url: String,

    #[serde(rename = "Size")]
    pub size: String,

    #[serde(rename = "Price")]
    pub price: String,
}

impl CatalogRow {
    /// Returns true if this row carries variant data rather than a bare stub
    pub fn is_variant(&self) -> bool {
        !self.size.is_empty() || !self.price.is_empty()
    }
}

impl From<&ProductStub> for ProductRecord {
    fn from(stub: &ProductStub) -> Self {
        Self {
            category: stub.category.clone(),
            product_name: stub.product_name.clone(),
            url: stub.url.clone(),
        }
    }
}

impl From<&ProductRecord> for CatalogRow {
    fn from(record: &ProductRecord) -> Self {
        Self {
            category: record.category.clone(),
            product_name: record.product_name.clone(),
            url: record.url.clone(),
            size: String::new(),
            price: String::new(),
        }
    }
}

impl From<&VariantRecord> for CatalogRow {
    fn from(record: &VariantRecord) -> Self {
        Self {
            category: record.category.clone(),
            product_name: record.product_name.clone(),
            url: record.url.clone(),
            size: record.size.clone(),
            price: record.price.clone(),
        }
    }
}
