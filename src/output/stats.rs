//! Statistics generation from the record store
//!
//! This module provides functionality for summarizing the rows of a record
//! store and displaying them.

use crate::storage::{CatalogRow, RecordStore};
use crate::Result;
use std::collections::{BTreeMap, HashSet};

/// Row counts for one category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    /// Distinct product URLs
    pub products: usize,

    /// Variant rows
    pub variants: usize,
}

/// Store statistics summary
#[derive(Debug, Clone, Default)]
pub struct StoreStatistics {
    /// Total number of data rows
    pub total_rows: usize,

    /// Rows with empty size and price
    pub product_rows: usize,

    pub variant_rows: usize,

    /// Number of distinct product URLs
    pub distinct_products: usize,

    /// Distinct products that have at least one variant row
    pub products_with_variants: usize,

    /// Counts per category, sorted by category name
    pub categories: BTreeMap<String, CategoryCounts>,
}

/// Summarizes a sequence of stored rows
pub fn summarize(rows: &[CatalogRow]) -> StoreStatistics {
    let mut stats = StoreStatistics {
        total_rows: rows.len(),
        ..StoreStatistics::default()
    };

    let mut products = HashSet::new();
    let mut with_variants = HashSet::new();
    let mut per_category: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();

    for row in rows {
        let counts = stats.categories.entry(row.category.clone()).or_default();
        if row.is_variant() {
            stats.variant_rows += 1;
            counts.variants += 1;
            with_variants.insert(row.url.as_str());
        } else {
            stats.product_rows += 1;
        }
        products.insert(row.url.as_str());
        per_category
            .entry(row.category.as_str())
            .or_default()
            .insert(row.url.as_str());
    }

    for (category, urls) in per_category {
        if let Some(counts) = stats.categories.get_mut(category) {
            counts.products = urls.len();
        }
    }
    stats.distinct_products = products.len();
    stats.products_with_variants = with_variants.len();
    stats
}

/// Loads statistics from a record store
///
/// # Arguments
///
/// * `store` - The store to read
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - Failed to read the store
pub fn load_statistics(store: &dyn RecordStore) -> Result<StoreStatistics> {
    let rows = store.read_all_rows()?;
    Ok(summarize(&rows))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Total rows: {}", stats.total_rows);
    println!("  Product rows: {}", stats.product_rows);
    println!("  Variant rows: {}", stats.variant_rows);
    println!("  Distinct products: {}", stats.distinct_products);
    println!();

    if !stats.categories.is_empty() {
        println!("Categories ({}):", stats.categories.len());
        for (category, counts) in &stats.categories {
            println!(
                "  {}: {} product(s), {} variant row(s)",
                category, counts.products, counts.variants
            );
        }
        println!();
    }

    let coverage = if stats.distinct_products > 0 {
        (stats.products_with_variants as f64 / stats.distinct_products as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Variant Coverage: {:.1}% ({} / {} products with at least one variant row)",
        coverage, stats.products_with_variants, stats.distinct_products
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, url: &str, size: &str, price: &str) -> CatalogRow {
        CatalogRow {
            category: category.to_string(),
            product_name: "Product".to_string(),
            url: url.to_string(),
            size: size.to_string(),
            price: price.to_string(),
        }
    }

    #[test]
    fn test_summarize_counts_rows() {
        let rows = vec![
            row("Mugs", "https://x.test/1", "", ""),
            row("Mugs", "https://x.test/1", "11oz", "USD 4.50"),
            row("Mugs", "https://x.test/1", "15oz", "USD 6.10"),
            row("Mugs", "https://x.test/2", "", ""),
            row("Posters", "https://x.test/3", "", ""),
        ];

        let stats = summarize(&rows);

        assert_eq!(stats.total_rows, 5);
        assert_eq!(stats.product_rows, 3);
        assert_eq!(stats.variant_rows, 2);
        assert_eq!(stats.distinct_products, 3);
        assert_eq!(stats.products_with_variants, 1);
        assert_eq!(
            stats.categories.get("Mugs"),
            Some(&CategoryCounts {
                products: 2,
                variants: 2
            })
        );
        assert_eq!(stats.categories["Posters"].products, 1);
    }

    #[test]
    fn test_summarize_empty_store() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_rows, 0);
        assert!(stats.categories.is_empty());
    }
}
