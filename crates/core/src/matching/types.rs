//! Types for the matching engine

use serde::{Deserialize, Serialize};

use crate::domain::product::Product;

/// Scoring dimension a product matched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchDimension {
    Occasion,
    Relationship,
    Interest,
    PersonalityTrait,
    PriceRange,
    AgeGroup,
    Gender,
    Keyword,
}

/// One matched facet, kept for explainability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedFacet {
    pub dimension: MatchDimension,
    pub value: String,
}

impl MatchedFacet {
    pub fn new(dimension: MatchDimension, value: impl Into<String>) -> Self {
        Self { dimension, value: value.into() }
    }
}

/// Product scored against a profile. Borrows from the catalog snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub product: &'a Product,
    pub score: f64,
    pub matched_facets: Vec<MatchedFacet>,
}

impl ScoredCandidate<'_> {
    pub fn to_ranked(&self) -> RankedProduct {
        RankedProduct {
            product: self.product.clone(),
            score: self.score,
            matched_facets: self.matched_facets.clone(),
        }
    }
}

/// Owned entry of a [`MatchResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProduct {
    pub product: Product,
    pub score: f64,
    pub matched_facets: Vec<MatchedFacet>,
}

/// Output of a suggestion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Ranked products, best first
    pub ranked: Vec<RankedProduct>,
    /// First entry of `ranked`, if any
    pub selected: Option<RankedProduct>,
    /// Message rendered for `selected`
    pub message: Option<String>,
    /// True when no product scored and a random sample was returned instead
    pub fallback_used: bool,
}

impl MatchResult {
    pub fn empty() -> Self {
        Self { ranked: Vec::new(), selected: None, message: None, fallback_used: false }
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}
