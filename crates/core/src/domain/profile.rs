use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::vocabulary::{Tag, TagSet, TechLevel, Tone};

/// Inclusive price range; `max: None` means unbounded above.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: Decimal,
    pub max: Option<Decimal>,
}

impl BudgetRange {
    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.min && self.max.map_or(true, |max| price <= max)
    }
}

/// Canonical recipient query.
///
/// Built only by [`crate::matching::ProfileNormalizer`] and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecipientProfile {
    pub(crate) recipient_name: Option<String>,
    pub(crate) occasion: Tag,
    pub(crate) relationship: Tag,
    pub(crate) age_group: Option<Tag>,
    pub(crate) gender: Option<Tag>,
    pub(crate) interests: TagSet,
    pub(crate) personality_traits: TagSet,
    pub(crate) lifestyle: Option<String>,
    pub(crate) tech_level: Option<TechLevel>,
    pub(crate) gift_preference: Option<String>,
    pub(crate) budget: Option<BudgetRange>,
    pub(crate) budget_bucket: Option<Tag>,
    pub(crate) tone: Tone,
    pub(crate) dislike_keywords: BTreeSet<String>,
    pub(crate) free_text_signals: Vec<String>,
}

impl RecipientProfile {
    pub fn recipient_name(&self) -> Option<&str> {
        self.recipient_name.as_deref()
    }

    pub fn occasion(&self) -> &Tag {
        &self.occasion
    }

    pub fn relationship(&self) -> &Tag {
        &self.relationship
    }

    pub fn age_group(&self) -> Option<&Tag> {
        self.age_group.as_ref()
    }

    pub fn gender(&self) -> Option<&Tag> {
        self.gender.as_ref()
    }

    pub fn interests(&self) -> &TagSet {
        &self.interests
    }

    pub fn personality_traits(&self) -> &TagSet {
        &self.personality_traits
    }

    pub fn lifestyle(&self) -> Option<&str> {
        self.lifestyle.as_deref()
    }

    pub fn tech_level(&self) -> Option<TechLevel> {
        self.tech_level
    }

    pub fn gift_preference(&self) -> Option<&str> {
        self.gift_preference.as_deref()
    }

    pub fn budget(&self) -> Option<&BudgetRange> {
        self.budget.as_ref()
    }

    pub fn budget_bucket(&self) -> Option<&Tag> {
        self.budget_bucket.as_ref()
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn dislike_keywords(&self) -> &BTreeSet<String> {
        &self.dislike_keywords
    }

    pub fn free_text_signals(&self) -> &[String] {
        &self.free_text_signals
    }

    /// Name used in messages; falls back to the relationship when no name was given.
    pub fn display_name(&self) -> String {
        match &self.recipient_name {
            Some(name) => name.clone(),
            None => self.relationship.label().to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_range_is_inclusive_and_optionally_unbounded() {
        let bounded = BudgetRange { min: Decimal::from(25), max: Some(Decimal::from(50)) };
        assert!(bounded.contains(Decimal::from(25)));
        assert!(bounded.contains(Decimal::from(50)));
        assert!(!bounded.contains(Decimal::new(5001, 2)));
        assert!(!bounded.contains(Decimal::new(2499, 2)));

        let open = BudgetRange { min: Decimal::from(200), max: None };
        assert!(open.contains(Decimal::from(10_000)));
        assert!(!open.contains(Decimal::from(199)));
    }
}
