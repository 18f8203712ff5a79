//! Recipient-to-product matching.
//!
//! Normalizes a raw recipient description, scores a catalog snapshot against it,
//! ranks the survivors and renders a personalized message for the top pick.

mod engine;
mod message;
mod normalizer;
mod ranker;
mod scoring;
mod types;

pub use engine::MatchingEngine;
pub use message::MessageSynthesizer;
pub use normalizer::{dislike_tokens, parse_budget, tokenize, ProfileNormalizer, RawRecipientInput};
pub use ranker::{Ranker, Ranking};
pub use scoring::{compare_products, HardFilter, ScoreCalculator, ScoringWeights};
pub use types::*;

/// Default scoring weights, one entry per matching dimension.
pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    occasion: 3.0,
    relationship: 3.0,
    interest: 1.0,
    personality_trait: 1.0,
    price_range: 2.0,
    age_group: 1.0,
    gender: 1.0,
    keyword: 1.0,
};

/// Results returned when browsing suggestions.
pub const DEFAULT_BROWSE_LIMIT: usize = 12;

/// Results returned by the "try another" flow.
pub const SINGLE_SUGGESTION_LIMIT: usize = 1;

/// Attempts allowed in the "try another" flow.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
