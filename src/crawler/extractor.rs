//! HTML extraction for listing, navigation and size-table snapshots
//!
//! This module turns rendered DOM snapshots into:
//! - The category list of the navigation menu
//! - The product stubs visible on a listing page
//! - The (size, price) rows of a provider's variants table
//!
//! Extraction is a pure read of the snapshot; nothing here touches the page.

use crate::config::SelectorConfig;
use crate::driver::{Driver, DriverError, DriverResult, Session};
use crate::storage::ProductStub;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::Url;

/// A product category found in the navigation menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    /// Identity of the category
    pub listing_url: String,
}

/// One row of a provider's variants table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedVariant {
    pub size: String,
    pub price: String,
}

fn css(selector: &str) -> DriverResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| DriverError::InvalidSelector(format!("{}: {:?}", selector, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolves an href against the site origin
///
/// Returns an empty string for a missing or unresolvable href, which callers
/// treat as "no URL".
fn resolve_href(href: Option<&str>, base_url: &Url) -> String {
    let Some(href) = href.map(str::trim).filter(|h| !h.is_empty()) else {
        return String::new();
    };

    match base_url.join(href) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!("Failed to resolve href {}: {}", href, e);
            String::new()
        }
    }
}

/// Reads the navigation menu's category links
///
/// Duplicate entries collapse to one per URL: the category keeps the
/// position of its first occurrence and the label of its last.
pub fn discover_categories(
    html: &str,
    base_url: &Url,
    selectors: &SelectorConfig,
) -> DriverResult<Vec<Category>> {
    let link_selector = css(&selectors.category_link)?;
    let document = Html::parse_document(html);

    let mut order = Vec::new();
    let mut by_url: HashMap<String, Category> = HashMap::new();

    for link in document.select(&link_selector) {
        let listing_url = resolve_href(link.value().attr("href"), base_url);
        if listing_url.is_empty() {
            continue;
        }

        let category = Category {
            name: element_text(link),
            listing_url: listing_url.clone(),
        };
        if by_url.insert(listing_url.clone(), category).is_none() {
            order.push(listing_url);
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|url| by_url.remove(&url))
        .collect())
}

/// Reads the product stubs of a listing snapshot
///
/// Anchors without an href yield a stub with an empty URL; anchors without a
/// name element yield an empty name.
pub fn extract_product_stubs(
    html: &str,
    base_url: &Url,
    category: &str,
    selectors: &SelectorConfig,
) -> DriverResult<Vec<ProductStub>> {
    let link_selector = css(&selectors.product_link)?;
    let name_selector = css(&selectors.product_name)?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&link_selector)
        .map(|link| ProductStub {
            category: category.to_string(),
            product_name: link
                .select(&name_selector)
                .next()
                .map(element_text)
                .unwrap_or_default(),
            url: resolve_href(link.value().attr("href"), base_url),
        })
        .collect())
}

/// Reads the variants table of a provider popup snapshot
///
/// # Returns
///
/// * `Ok(None)` - No variants table is rendered
/// * `Ok(Some(rows))` - One entry per table row; missing cells become empty strings
pub fn extract_variants(
    html: &str,
    selectors: &SelectorConfig,
) -> DriverResult<Option<Vec<HarvestedVariant>>> {
    let table_selector = css(&selectors.variants_table)?;
    let row_selector = css(&selectors.variant_row)?;
    let size_selector = css(&selectors.variant_size)?;
    let price_selector = css(&selectors.variant_price)?;
    let document = Html::parse_document(html);

    if document.select(&table_selector).next().is_none() {
        return Ok(None);
    }

    let variants = document
        .select(&row_selector)
        .map(|row| HarvestedVariant {
            size: row
                .select(&size_selector)
                .next()
                .map(element_text)
                .unwrap_or_default(),
            price: row
                .select(&price_selector)
                .next()
                .map(element_text)
                .unwrap_or_default(),
        })
        .collect();

    Ok(Some(variants))
}

/// Scrolls the listing to its end, lets it settle, and reads its stubs
pub async fn extract_listing<D: Driver>(
    session: &Session<'_, D>,
    base_url: &Url,
    category: &str,
    selectors: &SelectorConfig,
) -> DriverResult<Vec<ProductStub>> {
    session
        .scroll_to_bottom(session.timing().settle_after_scroll)
        .await?;
    let html = session.driver().content().await?;
    extract_product_stubs(&html, base_url, category, selectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://printify.com").unwrap()
    }

    #[test]
    fn test_discover_categories_dedupes_by_url() {
        let html = r#"
            <nav class="nav">
              <a href="/app/products/mugs">Mugs</a>
              <a href="/app/products/t-shirts">T-Shirts</a>
              <a href="/app/products/mugs">Mugs &amp; Cups</a>
              <a href="/about">About</a>
            </nav>"#;

        let categories = discover_categories(html, &base(), &SelectorConfig::default()).unwrap();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].listing_url, "https://printify.com/app/products/mugs");
        assert_eq!(categories[0].name, "Mugs & Cups");
        assert_eq!(categories[1].name, "T-Shirts");
    }

    #[test]
    fn test_extract_product_stubs() {
        let html = r#"
            <a class="wrapper-link" href="/app/products/1/mug">
              <p data-testid="blueprintName"> Mug 11oz </p>
            </a>
            <a class="wrapper-link" href="/app/products/2/poster"></a>
            <a class="wrapper-link"><p data-testid="blueprintName">No link</p></a>"#;

        let stubs =
            extract_product_stubs(html, &base(), "Mugs", &SelectorConfig::default()).unwrap();

        assert_eq!(stubs.len(), 3);
        assert_eq!(stubs[0].product_name, "Mug 11oz");
        assert_eq!(stubs[0].url, "https://printify.com/app/products/1/mug");
        assert_eq!(stubs[0].category, "Mugs");
        assert_eq!(stubs[1].product_name, "");
        assert_eq!(stubs[2].url, "");
    }

    #[test]
    fn test_extract_product_stubs_empty_page() {
        let stubs = extract_product_stubs(
            "<html><body><p>No products</p></body></html>",
            &base(),
            "Mugs",
            &SelectorConfig::default(),
        )
        .unwrap();
        assert!(stubs.is_empty());
    }

    #[test]
    fn test_extract_variants_without_table() {
        let html = r#"<pfy-variants-table-title-row></pfy-variants-table-title-row>"#;
        assert_eq!(
            extract_variants(html, &SelectorConfig::default()).unwrap(),
            None
        );
    }

    #[test]
    fn test_extract_variants_rows() {
        let html = r#"
            <pfy-variants-table data-testid="variantsTable">
              <table><tbody>
                <tr><td>
                  <pfy-variants-table-title-row>
                    <table><tr><td class="selected-option">
                      <pfy-variants-table-column-text><span data-testid="columnText"> S </span></pfy-variants-table-column-text>
                    </td><td><span data-testid="standardPrice">USD 10.50</span></td></tr></table>
                  </pfy-variants-table-title-row>
                </td></tr>
                <tr><td>
                  <pfy-variants-table-title-row>
                    <table><tr><td><span data-testid="standardPrice">USD 12.00</span></td></tr></table>
                  </pfy-variants-table-title-row>
                </td></tr>
              </tbody></table>
            </pfy-variants-table>"#;

        let variants = extract_variants(html, &SelectorConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(
            variants,
            vec![
                HarvestedVariant {
                    size: "S".to_string(),
                    price: "USD 10.50".to_string()
                },
                HarvestedVariant {
                    size: String::new(),
                    price: "USD 12.00".to_string()
                },
            ]
        );
    }
}
