//! Matching engine entry points

use std::collections::HashSet;

use rand::Rng;

use super::message::MessageSynthesizer;
use super::ranker::Ranker;
use super::scoring::{ScoreCalculator, ScoringWeights};
use super::types::{MatchResult, RankedProduct};
use crate::domain::product::{Product, ProductId};
use crate::domain::profile::RecipientProfile;
use crate::errors::ApplicationError;

/// Pure, synchronous engine. Holds only immutable configuration and compiled templates.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    ranker: Ranker,
    synthesizer: MessageSynthesizer,
}

impl MatchingEngine {
    pub fn new(
        weights: ScoringWeights,
        max_per_category: Option<usize>,
    ) -> Result<Self, ApplicationError> {
        let synthesizer = MessageSynthesizer::new().map_err(|error| {
            ApplicationError::Configuration(format!("message templates failed to compile: {error}"))
        })?;
        let ranker =
            Ranker::new(ScoreCalculator::with_weights(weights)).with_max_per_category(max_per_category);
        Ok(Self { ranker, synthesizer })
    }

    pub fn with_defaults() -> Result<Self, ApplicationError> {
        Self::new(ScoringWeights::default(), None)
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    /// Ranks `catalog` for `profile` and renders a message for the top entry.
    ///
    /// An empty result is not an error.
    pub fn get_suggestions<R: Rng + ?Sized>(
        &self,
        profile: &RecipientProfile,
        catalog: &[Product],
        exclude: &HashSet<ProductId>,
        top_n: usize,
        rng: &mut R,
    ) -> Result<MatchResult, ApplicationError> {
        let ranking = self.ranker.rank(profile, catalog, exclude, top_n, rng);
        let ranked: Vec<RankedProduct> =
            ranking.candidates.iter().map(|candidate| candidate.to_ranked()).collect();

        let Some(selected) = ranked.first().cloned() else {
            return Ok(MatchResult { fallback_used: ranking.fallback_used, ..MatchResult::empty() });
        };
        let message = self.get_message(profile, &selected.product, rng)?;

        Ok(MatchResult {
            ranked,
            selected: Some(selected),
            message: Some(message),
            fallback_used: ranking.fallback_used,
        })
    }

    pub fn get_message<R: Rng + ?Sized>(
        &self,
        profile: &RecipientProfile,
        product: &Product,
        rng: &mut R,
    ) -> Result<String, ApplicationError> {
        self.synthesizer.synthesize(profile, product, rng).map_err(|error| {
            ApplicationError::Configuration(format!("message rendering failed: {error}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::domain::product::fixtures::product;
    use crate::domain::vocabulary::Tone;
    use crate::matching::{MatchDimension, ProfileNormalizer, RawRecipientInput};

    fn engine() -> MatchingEngine {
        match MatchingEngine::with_defaults() {
            Ok(engine) => engine,
            Err(error) => panic!("engine should build: {error}"),
        }
    }

    fn birthday_gamer() -> RecipientProfile {
        let raw = RawRecipientInput {
            recipient_name: Some("Riley".to_string()),
            occasion: Some("Birthday".to_string()),
            relationship: Some("Friend".to_string()),
            hobbies: vec!["Gaming".to_string()],
            budget_min: Some(0.into()),
            budget_max: Some(50.into()),
            tone: Some("Funny".to_string()),
            ..RawRecipientInput::default()
        };
        match ProfileNormalizer::new().normalize(&raw) {
            Ok(profile) => profile,
            Err(error) => panic!("profile should normalize: {error}"),
        }
    }

    #[test]
    fn birthday_friend_gamer_gets_only_the_active_match_with_a_funny_message() {
        let mut active = product("game-night", 20);
        active.title = "Party Game Night Kit".to_string();
        active.facets.occasions = ["Birthday"].into_iter().collect();
        active.facets.relationships = ["Friend"].into_iter().collect();
        active.facets.interests = ["Gaming"].into_iter().collect();
        let mut inactive = active.clone();
        inactive.id = ProductId::from("game-night-retired");
        inactive.is_active = false;
        let catalog = vec![inactive, active];
        let profile = birthday_gamer();
        assert_eq!(profile.tone(), Tone::Funny);

        let result = engine()
            .get_suggestions(&profile, &catalog, &HashSet::new(), 12, &mut StdRng::seed_from_u64(8))
            .expect("suggestions");

        assert_eq!(result.ranked.len(), 1);
        let selected = result.selected.expect("selected product");
        assert_eq!(selected.product.id.0, "game-night");
        assert_eq!(selected.score, 7.0);
        assert!(selected
            .matched_facets
            .iter()
            .any(|facet| facet.dimension == MatchDimension::Occasion));
        let message = result.message.expect("message");
        assert!(message.contains("party game night kit"));
        assert!(message.contains("Riley"));
        assert!(!result.fallback_used);
    }

    #[test]
    fn empty_catalog_yields_empty_result_without_message() {
        let result = engine()
            .get_suggestions(&birthday_gamer(), &[], &HashSet::new(), 12, &mut StdRng::seed_from_u64(8))
            .expect("suggestions");

        assert!(result.is_empty());
        assert!(result.selected.is_none());
        assert!(result.message.is_none());
    }

    #[test]
    fn over_budget_catalog_still_produces_a_suggestion() {
        let catalog = vec![product("too-much", 80)];

        let result = engine()
            .get_suggestions(
                &birthday_gamer(),
                &catalog,
                &HashSet::new(),
                12,
                &mut StdRng::seed_from_u64(8),
            )
            .expect("suggestions");

        assert!(result.fallback_used);
        assert_eq!(result.selected.map(|entry| entry.product.id.0), Some("too-much".to_string()));
        assert!(result.message.is_some());
    }

    #[test]
    fn fallback_result_still_carries_a_message() {
        let catalog = vec![product("plain", 10)];

        let result = engine()
            .get_suggestions(
                &birthday_gamer(),
                &catalog,
                &HashSet::new(),
                1,
                &mut StdRng::seed_from_u64(8),
            )
            .expect("suggestions");

        assert!(result.fallback_used);
        assert_eq!(result.selected.map(|entry| entry.product.id.0), Some("plain".to_string()));
        assert!(result.message.is_some());
    }
}
