//! Catalog collaborator consumed by the suggestion service.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::Product;
use crate::matching::compare_products;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),
    #[error("catalog data could not be decoded: {0}")]
    Decode(String),
}

/// Read side of the product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Snapshot of every active product. Row order carries no meaning.
    async fn list_active_products(&self) -> Result<Vec<Product>, CatalogError>;
}

/// Browse-screen filters. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl BrowseQuery {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(search) = non_blank(self.search.as_deref()) {
            let needle = search.to_lowercase();
            let haystack = format!(
                "{} {} {} {}",
                product.title,
                product.description,
                product.category,
                product.tags.labels().join(" ")
            )
            .to_lowercase();
            if !haystack.contains(&needle) {
                return false;
            }
        }
        if let Some(category) = non_blank(self.category.as_deref()) {
            if !category.eq_ignore_ascii_case("all")
                && !product.category.trim().eq_ignore_ascii_case(category)
            {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        true
    }
}

/// Filters a snapshot for browsing; best-placed products first.
pub fn browse(products: Vec<Product>, query: &BrowseQuery) -> Vec<Product> {
    let mut matching: Vec<Product> = products
        .into_iter()
        .filter(|product| product.is_active && product.validate().is_ok())
        .filter(|product| query.matches(product))
        .collect();
    matching.sort_by(compare_products);
    matching
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::fixtures::product;

    fn catalog() -> Vec<Product> {
        let mut headphones = product("headphones", 150);
        headphones.title = "Wireless Headphones".to_string();
        headphones.category = "Electronics".to_string();
        headphones.rating = 4.8;

        let mut journal = product("journal", 20);
        journal.title = "Leather Journal".to_string();
        journal.category = "Stationery".to_string();
        journal.tags = ["writing"].into_iter().collect();

        let mut speaker = product("speaker", 60);
        speaker.title = "Pocket Speaker".to_string();
        speaker.category = "Electronics".to_string();
        speaker.priority = 3;

        let mut retired = product("retired", 10);
        retired.is_active = false;

        vec![headphones, journal, speaker, retired]
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|product| product.id.0.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_active_products_by_priority_then_rating() {
        let results = browse(catalog(), &BrowseQuery::default());

        assert_eq!(ids(&results), vec!["speaker", "headphones", "journal"]);
    }

    #[test]
    fn search_matches_title_and_tags_case_insensitively() {
        let by_title =
            browse(catalog(), &BrowseQuery { search: Some("HEADPHONES".into()), ..Default::default() });
        assert_eq!(ids(&by_title), vec!["headphones"]);

        let by_tag =
            browse(catalog(), &BrowseQuery { search: Some("writing".into()), ..Default::default() });
        assert_eq!(ids(&by_tag), vec!["journal"]);
    }

    #[test]
    fn category_and_price_filters_combine() {
        let query = BrowseQuery {
            category: Some("electronics".into()),
            max_price: Some(Decimal::from(100)),
            ..Default::default()
        };
        assert_eq!(ids(&browse(catalog(), &query)), vec!["speaker"]);

        let all = BrowseQuery {
            category: Some("All".into()),
            min_price: Some(Decimal::from(50)),
            ..Default::default()
        };
        assert_eq!(ids(&browse(catalog(), &all)), vec!["speaker", "headphones"]);
    }
}
