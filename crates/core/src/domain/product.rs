use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::vocabulary::TagSet;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Facet sets used purely for matching a product against a recipient.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchFacets {
    pub occasions: TagSet,
    pub relationships: TagSet,
    pub age_groups: TagSet,
    pub genders: TagSet,
    pub interests: TagSet,
    pub price_ranges: TagSet,
    pub personality_traits: TagSet,
}

impl MatchFacets {
    pub fn all_tags(&self) -> impl Iterator<Item = &super::vocabulary::Tag> {
        self.occasions
            .iter()
            .chain(self.relationships.iter())
            .chain(self.age_groups.iter())
            .chain(self.genders.iter())
            .chain(self.interests.iter())
            .chain(self.price_ranges.iter())
            .chain(self.personality_traits.iter())
    }
}

/// Catalog entry. Read-only from the engine's point of view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub retailer: String,
    pub rating: f64,
    pub review_count: u32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default)]
    pub facets: MatchFacets,
    pub is_active: bool,
    #[serde(default)]
    pub priority: i32,
}

impl Product {
    /// Lowercased title, description and general tags; the free-text keyword dimension
    /// searches this.
    pub fn keyword_text(&self) -> String {
        let mut text = format!("{} {}", self.title, self.description);
        for tag in self.tags.iter() {
            text.push(' ');
            text.push_str(tag.key());
        }
        text.to_lowercase()
    }

    /// [`Product::keyword_text`] plus every match facet; the dislike filter searches this.
    pub fn searchable_text(&self) -> String {
        let mut text = self.keyword_text();
        for tag in self.facets.all_tags() {
            text.push(' ');
            text.push_str(tag.key());
        }
        text
    }

    /// Data-quality check for externally managed catalog rows.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.0.trim().is_empty() {
            return Err("product id is blank".to_string());
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(format!("product `{}` has negative price {}", self.id, self.price));
        }
        if !self.rating.is_finite() || !(0.0..=5.0).contains(&self.rating) {
            return Err(format!("product `{}` has rating {} outside 0..=5", self.id, self.rating));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Active product with no facets; tests fill in what they need.
    pub fn product(id: &str, price: i64) -> Product {
        Product {
            id: ProductId(id.to_string()),
            title: format!("Product {id}"),
            description: String::new(),
            price: Decimal::from(price),
            category: "General".to_string(),
            retailer: "Various Retailers".to_string(),
            rating: 4.0,
            review_count: 10,
            features: Vec::new(),
            tags: TagSet::new(),
            facets: MatchFacets::default(),
            is_active: true,
            priority: 0,
        }
    }
}
