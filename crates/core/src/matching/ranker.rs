//! Ordering, exclusion and selection of scored candidates

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use super::scoring::{compare_candidates, ScoreCalculator};
use super::types::ScoredCandidate;
use crate::domain::product::{Product, ProductId};
use crate::domain::profile::RecipientProfile;

/// Ranked candidates plus whether they came from the random fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<'a> {
    pub candidates: Vec<ScoredCandidate<'a>>,
    pub fallback_used: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Ranker {
    calculator: ScoreCalculator,
    max_per_category: Option<usize>,
}

impl Ranker {
    pub fn new(calculator: ScoreCalculator) -> Self {
        Self { calculator, max_per_category: None }
    }

    /// Caps how many results may share a category; overflow back-fills free slots.
    pub fn with_max_per_category(mut self, max_per_category: Option<usize>) -> Self {
        self.max_per_category = max_per_category.filter(|cap| *cap > 0);
        self
    }

    pub fn calculator(&self) -> &ScoreCalculator {
        &self.calculator
    }

    /// Scores the eligible part of `catalog` and returns at most `top_n` candidates.
    ///
    /// When nothing scores above zero, a uniform random sample is returned instead:
    /// products passing the hard filters first, then the rest of the active, unexcluded
    /// catalog. Never fails; an empty catalog yields an empty ranking.
    pub fn rank<'a, R: Rng + ?Sized>(
        &self,
        profile: &RecipientProfile,
        catalog: &'a [Product],
        exclude: &HashSet<ProductId>,
        top_n: usize,
        rng: &mut R,
    ) -> Ranking<'a> {
        if top_n == 0 {
            return Ranking { candidates: Vec::new(), fallback_used: false };
        }

        let available = available(catalog, exclude);
        let (eligible, filtered_out): (Vec<&'a Product>, Vec<&'a Product>) =
            available.into_iter().partition(|product| self.passes_hard_filters(profile, product));

        let mut scored: Vec<ScoredCandidate<'a>> = eligible
            .iter()
            .map(|&product| self.calculator.score(profile, product))
            .filter(|candidate| candidate.score > 0.0)
            .collect();

        if scored.is_empty() {
            debug!(
                eligible = eligible.len(),
                filtered_out = filtered_out.len(),
                top_n,
                "no product matched the profile; sampling active catalog"
            );
            let mut picked: Vec<&'a Product> =
                eligible.choose_multiple(rng, top_n).copied().collect();
            let remaining = top_n - picked.len();
            picked.extend(filtered_out.choose_multiple(rng, remaining).copied());
            let candidates = picked
                .into_iter()
                .map(|product| ScoredCandidate { product, score: 0.0, matched_facets: Vec::new() })
                .collect();
            return Ranking { candidates, fallback_used: true };
        }

        scored.sort_by(compare_candidates);
        let candidates = match self.max_per_category {
            Some(cap) => diversify(scored, cap, top_n),
            None => {
                scored.truncate(top_n);
                scored
            }
        };
        Ranking { candidates, fallback_used: false }
    }

    fn passes_hard_filters(&self, profile: &RecipientProfile, product: &Product) -> bool {
        match self.calculator.hard_filter(profile, product) {
            None => true,
            Some(filter) => {
                debug!(product_id = %product.id, ?filter, "product removed by hard filter");
                false
            }
        }
    }
}

/// Active, unexcluded, well-formed products.
fn available<'a>(catalog: &'a [Product], exclude: &HashSet<ProductId>) -> Vec<&'a Product> {
    catalog
        .iter()
        .filter(|product| product.is_active && !exclude.contains(&product.id))
        .filter(|product| match product.validate() {
            Ok(()) => true,
            Err(reason) => {
                warn!(product_id = %product.id, %reason, "skipping malformed catalog product");
                false
            }
        })
        .collect()
}

/// Keeps rank order while limiting each category to `cap` entries, then back-fills.
fn diversify<'a>(
    ranked: Vec<ScoredCandidate<'a>>,
    cap: usize,
    top_n: usize,
) -> Vec<ScoredCandidate<'a>> {
    let mut category_counts: HashMap<&str, usize> = HashMap::new();
    let mut diverse = Vec::new();
    let mut overflow = Vec::new();

    for candidate in ranked {
        let count = category_counts.entry(candidate.product.category.as_str()).or_insert(0);
        if *count < cap {
            diverse.push(candidate);
            *count += 1;
        } else {
            overflow.push(candidate);
        }
    }

    let needed = top_n.saturating_sub(diverse.len());
    diverse.truncate(top_n);
    diverse.extend(overflow.into_iter().take(needed));
    diverse
}
