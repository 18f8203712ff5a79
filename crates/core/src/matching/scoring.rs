//! Weighted multi-factor scoring and hard filters

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::types::{MatchDimension, MatchedFacet, ScoredCandidate};
use crate::domain::product::Product;
use crate::domain::profile::RecipientProfile;
use crate::domain::vocabulary::ANY_GENDER;

/// Weight per matching dimension. Set-valued dimensions add their weight once per match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub occasion: f64,
    pub relationship: f64,
    pub interest: f64,
    pub personality_trait: f64,
    pub price_range: f64,
    pub age_group: f64,
    pub gender: f64,
    pub keyword: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

impl ScoringWeights {
    pub fn entries(&self) -> [(&'static str, f64); 8] {
        [
            ("occasion", self.occasion),
            ("relationship", self.relationship),
            ("interest", self.interest),
            ("personality_trait", self.personality_trait),
            ("price_range", self.price_range),
            ("age_group", self.age_group),
            ("gender", self.gender),
            ("keyword", self.keyword),
        ]
    }

    fn weight(&self, dimension: MatchDimension) -> f64 {
        match dimension {
            MatchDimension::Occasion => self.occasion,
            MatchDimension::Relationship => self.relationship,
            MatchDimension::Interest => self.interest,
            MatchDimension::PersonalityTrait => self.personality_trait,
            MatchDimension::PriceRange => self.price_range,
            MatchDimension::AgeGroup => self.age_group,
            MatchDimension::Gender => self.gender,
            MatchDimension::Keyword => self.keyword,
        }
    }
}

/// Reason a product was removed before scoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardFilter {
    Dislike { keyword: String },
    OverBudget,
}

/// Score calculator for recipient/product pairs
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    weights: ScoringWeights,
}

impl ScoreCalculator {
    /// Create a new score calculator with default weights
    pub fn new() -> Self {
        Self { weights: ScoringWeights::default() }
    }

    /// Create with custom weights
    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Returns the first hard filter the product fails, if any.
    pub fn hard_filter(&self, profile: &RecipientProfile, product: &Product) -> Option<HardFilter> {
        if let Some(budget) = profile.budget() {
            if !budget.contains(product.price) {
                return Some(HardFilter::OverBudget);
            }
        }

        if profile.dislike_keywords().is_empty() {
            return None;
        }
        let searchable = product.searchable_text();
        profile
            .dislike_keywords()
            .iter()
            .find(|keyword| {
                dislike_forms(keyword).iter().any(|form| searchable.contains(form.as_str()))
            })
            .map(|keyword| HardFilter::Dislike { keyword: keyword.clone() })
    }

    /// Weighted sum over every dimension the product matches.
    pub fn score<'a>(&self, profile: &RecipientProfile, product: &'a Product) -> ScoredCandidate<'a> {
        let facets = &product.facets;
        let mut matched = Vec::new();

        if facets.occasions.contains(profile.occasion()) {
            matched.push(MatchedFacet::new(MatchDimension::Occasion, profile.occasion().label()));
        }
        if facets.relationships.contains(profile.relationship()) {
            matched.push(MatchedFacet::new(
                MatchDimension::Relationship,
                profile.relationship().label(),
            ));
        }
        for interest in profile.interests().intersection(&facets.interests) {
            matched.push(MatchedFacet::new(MatchDimension::Interest, interest.label()));
        }
        for trait_tag in profile.personality_traits().intersection(&facets.personality_traits) {
            matched.push(MatchedFacet::new(MatchDimension::PersonalityTrait, trait_tag.label()));
        }
        if let Some(bucket) = profile.budget_bucket() {
            if facets.price_ranges.contains(bucket) {
                matched.push(MatchedFacet::new(MatchDimension::PriceRange, bucket.label()));
            }
        }
        if let Some(age_group) = profile.age_group() {
            if facets.age_groups.contains(age_group) {
                matched.push(MatchedFacet::new(MatchDimension::AgeGroup, age_group.label()));
            }
        }
        if let Some(gender) = profile.gender() {
            if facets.genders.contains(gender) || facets.genders.contains_key(&any_gender_key()) {
                matched.push(MatchedFacet::new(MatchDimension::Gender, gender.label()));
            }
        }
        if !profile.free_text_signals().is_empty() {
            let keyword_text = product.keyword_text();
            for token in profile.free_text_signals() {
                if keyword_text.contains(token.as_str()) {
                    matched.push(MatchedFacet::new(MatchDimension::Keyword, token.as_str()));
                }
            }
        }

        let score = matched.iter().map(|facet| self.weights.weight(facet.dimension)).sum();
        ScoredCandidate { product, score, matched_facets: matched }
    }
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordering for ranked candidates: score, then priority, rating, review count, id.
pub fn compare_candidates(a: &ScoredCandidate<'_>, b: &ScoredCandidate<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| compare_products(a.product, b.product))
}

/// Tie-break chain shared by ranking and browsing.
pub fn compare_products(a: &Product, b: &Product) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.rating.total_cmp(&a.rating))
        .then_with(|| b.review_count.cmp(&a.review_count))
        .then_with(|| a.id.cmp(&b.id))
}

fn any_gender_key() -> String {
    ANY_GENDER.to_lowercase()
}

/// The keyword plus its naive singular, so "nuts" also excludes "peanut".
fn dislike_forms(keyword: &str) -> Vec<String> {
    let mut forms = vec![keyword.to_string()];
    let chars = keyword.chars().count();
    if chars > 4 && keyword.ends_with("ies") {
        forms.push(format!("{}y", &keyword[..keyword.len() - 3]));
    } else if chars > 3 && keyword.ends_with('s') && !keyword.ends_with("ss") {
        forms.push(keyword[..keyword.len() - 1].to_string());
    }
    forms
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::product::fixtures::product;
    use crate::matching::{ProfileNormalizer, RawRecipientInput};

    fn profile(configure: impl FnOnce(&mut RawRecipientInput)) -> RecipientProfile {
        let mut raw = RawRecipientInput {
            occasion: Some("Birthday".to_string()),
            relationship: Some("Friend".to_string()),
            hobbies: vec!["Gaming".to_string()],
            tone: Some("Funny".to_string()),
            ..RawRecipientInput::default()
        };
        configure(&mut raw);
        match ProfileNormalizer::new().normalize(&raw) {
            Ok(profile) => profile,
            Err(error) => panic!("test profile should normalize: {error}"),
        }
    }

    #[test]
    fn every_dimension_contributes_its_default_weight() {
        let recipient = profile(|raw| {
            raw.hobbies = vec!["Gaming".to_string(), "Music".to_string()];
            raw.personality_traits = vec!["Playful".to_string()];
            raw.age_range = Some("18-25".to_string());
            raw.recipient_gender = Some("Male".to_string());
            raw.price_range = Some("$25-50".to_string());
            raw.personality = Some("retro arcade fan".to_string());
        });

        let mut item = product("arcade", 40);
        item.title = "Retro Arcade Cabinet".to_string();
        item.facets.occasions = ["Birthday"].into_iter().collect();
        item.facets.relationships = ["friend"].into_iter().collect();
        item.facets.interests = ["gaming", "music", "cooking"].into_iter().collect();
        item.facets.personality_traits = ["Playful"].into_iter().collect();
        item.facets.price_ranges = ["$25-50"].into_iter().collect();
        item.facets.age_groups = ["18-25"].into_iter().collect();
        item.facets.genders = ["Any"].into_iter().collect();

        let scored = ScoreCalculator::new().score(&recipient, &item);

        // 3 + 3 + 2 interests + 1 trait + 2 bucket + 1 age + 1 gender + 2 keywords
        assert_eq!(scored.score, 15.0);
        let keywords: Vec<_> = scored
            .matched_facets
            .iter()
            .filter(|facet| facet.dimension == MatchDimension::Keyword)
            .map(|facet| facet.value.as_str())
            .collect();
        assert_eq!(keywords, vec!["retro", "arcade"]);
    }

    #[test]
    fn unrelated_product_scores_zero() {
        let recipient = profile(|_| {});
        let plain = product("plain", 10);
        let scored = ScoreCalculator::new().score(&recipient, &plain);

        assert_eq!(scored.score, 0.0);
        assert!(scored.matched_facets.is_empty());
    }

    #[test]
    fn adding_a_shared_interest_never_lowers_the_score() {
        let mut item = product("console", 30);
        item.facets.interests = ["Gaming", "Technology"].into_iter().collect();

        let narrow = profile(|_| {});
        let wide = profile(|raw| raw.hobbies.push("Technology".to_string()));
        let calculator = ScoreCalculator::new();

        assert!(calculator.score(&wide, &item).score >= calculator.score(&narrow, &item).score);
        assert_eq!(calculator.score(&wide, &item).score, 2.0);
    }

    #[test]
    fn custom_weights_are_applied() {
        let weights = ScoringWeights { occasion: 10.0, ..ScoringWeights::default() };
        let mut item = product("cake", 20);
        item.facets.occasions = ["Birthday"].into_iter().collect();

        let scored = ScoreCalculator::with_weights(weights).score(&profile(|_| {}), &item);

        assert_eq!(scored.score, 10.0);
    }

    #[test]
    fn budget_filter_excludes_out_of_range_prices() {
        let recipient = profile(|raw| raw.budget = Some("Under $25".to_string()));
        let calculator = ScoreCalculator::new();

        assert_eq!(
            calculator.hard_filter(&recipient, &product("pricey", 30)),
            Some(HardFilter::OverBudget)
        );
        assert_eq!(calculator.hard_filter(&recipient, &product("cheap", 25)), None);

        let mut cents = product("cents", 0);
        cents.price = Decimal::new(2501, 2);
        assert_eq!(calculator.hard_filter(&recipient, &cents), Some(HardFilter::OverBudget));
    }

    #[test]
    fn dislike_filter_matches_naive_singular_forms() {
        let recipient = profile(|raw| raw.dislikes = Some("nuts".to_string()));
        let mut basket = product("basket", 20);
        basket.description = "Peanut gift basket".to_string();

        assert_eq!(
            ScoreCalculator::new().hard_filter(&recipient, &basket),
            Some(HardFilter::Dislike { keyword: "nuts".to_string() })
        );
    }

    #[test]
    fn two_letter_dislike_still_excludes() {
        let recipient = profile(|raw| raw.dislikes = Some("TV".to_string()));
        let mut stick = product("stick", 20);
        stick.title = "Smart TV stick".to_string();

        assert_eq!(
            ScoreCalculator::new().hard_filter(&recipient, &stick),
            Some(HardFilter::Dislike { keyword: "tv".to_string() })
        );
    }

    #[test]
    fn dislike_filter_searches_facets_too() {
        let recipient = profile(|raw| raw.dislikes = Some("candles".to_string()));
        let mut item = product("spa", 20);
        item.facets.interests = ["Candle Making"].into_iter().collect();

        assert!(matches!(
            ScoreCalculator::new().hard_filter(&recipient, &item),
            Some(HardFilter::Dislike { .. })
        ));
    }

    #[test]
    fn naive_singular_handles_common_endings() {
        assert_eq!(dislike_forms("nuts"), vec!["nuts", "nut"]);
        assert_eq!(dislike_forms("berries"), vec!["berries", "berry"]);
        assert_eq!(dislike_forms("glass"), vec!["glass"]);
        assert_eq!(dislike_forms("gas"), vec!["gas"]);
    }

    #[test]
    fn tie_break_prefers_priority_then_rating_then_reviews_then_id() {
        let mut a = product("a", 10);
        let mut b = product("b", 10);
        assert_eq!(compare_products(&a, &b), Ordering::Less);

        b.review_count = 50;
        assert_eq!(compare_products(&a, &b), Ordering::Greater);

        a.rating = 4.5;
        assert_eq!(compare_products(&a, &b), Ordering::Less);

        b.priority = 1;
        assert_eq!(compare_products(&a, &b), Ordering::Greater);
    }
}
