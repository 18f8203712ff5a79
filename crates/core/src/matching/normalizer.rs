//! Raw recipient form input to [`RecipientProfile`].

use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::profile::{BudgetRange, RecipientProfile};
use crate::domain::vocabulary::{PriceBucket, Tag, TagSet, TechLevel, Tone, AGE_GROUPS, GENDERS};
use crate::errors::ValidationError;

/// Free-text tokens shorter than this carry no signal.
const MIN_TOKEN_CHARS: usize = 3;

/// Dislikes are hard exclusions, so only single characters are dropped.
const MIN_DISLIKE_CHARS: usize = 2;

const STOP_WORDS: &[&str] = &[
    "about", "all", "also", "and", "any", "are", "but", "from", "had", "has", "have", "her",
    "him", "his", "into", "just", "not", "our", "really", "she", "some", "that", "the", "their",
    "them", "they", "this", "very", "was", "were", "what", "who", "with", "you", "your",
];

/// Recipient description as submitted by the web form or CLI profile file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRecipientInput {
    pub recipient_name: Option<String>,
    pub occasion: Option<String>,
    pub relationship: Option<String>,
    #[serde(alias = "gender")]
    pub recipient_gender: Option<String>,
    #[serde(alias = "ageGroup")]
    pub age_range: Option<String>,
    pub personality: Option<String>,
    #[serde(alias = "interests")]
    pub hobbies: Vec<String>,
    pub personality_traits: Vec<String>,
    pub lifestyle: Option<String>,
    #[serde(alias = "techLevel")]
    pub tech_savviness: Option<String>,
    pub gift_preference: Option<String>,
    pub budget: Option<String>,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub price_range: Option<String>,
    pub tone: Option<String>,
    pub favorite_colors: Option<String>,
    pub dislikes: Option<String>,
    pub recent_events: Option<String>,
    pub special_notes: Option<String>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ProfileNormalizer;

impl ProfileNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &RawRecipientInput) -> Result<RecipientProfile, ValidationError> {
        let occasion = required_tag(raw.occasion.as_deref(), "occasion")?;
        let relationship = required_tag(raw.relationship.as_deref(), "relationship")?;

        let interests: TagSet = raw.hobbies.iter().collect();
        if interests.is_empty() {
            return Err(ValidationError::MissingField { field: "interests" });
        }

        let tone = match non_blank(raw.tone.as_deref()) {
            Some(label) => Tone::from_label(label),
            None => return Err(ValidationError::MissingField { field: "tone" }),
        };

        let age_group = closed_tag(raw.age_range.as_deref(), AGE_GROUPS, "age range")?;
        let gender = closed_tag(raw.recipient_gender.as_deref(), GENDERS, "gender")?;

        let budget_label = non_blank(raw.budget.as_deref());
        let budget = match budget_label {
            Some(label) => Some(parse_budget(label)?),
            None => numeric_budget(raw.budget_min, raw.budget_max)?,
        };

        let budget_bucket = match non_blank(raw.price_range.as_deref()) {
            Some(label) => Some(
                PriceBucket::from_label(label)
                    .ok_or_else(|| ValidationError::UnknownValue {
                        field: "price range",
                        value: label.to_string(),
                    })?
                    .tag(),
            ),
            None => budget_label.and_then(PriceBucket::from_label).map(|bucket| bucket.tag()),
        };

        let dislike_keywords: BTreeSet<String> =
            raw.dislikes.as_deref().map(dislike_tokens).unwrap_or_default().into_iter().collect();

        let signal_sources = [
            raw.personality.as_deref(),
            raw.special_notes.as_deref(),
            raw.favorite_colors.as_deref(),
            raw.recent_events.as_deref(),
        ];
        let free_text = signal_sources.into_iter().flatten().collect::<Vec<_>>().join(" ");

        Ok(RecipientProfile {
            recipient_name: non_blank(raw.recipient_name.as_deref()).map(str::to_string),
            occasion,
            relationship,
            age_group,
            gender,
            interests,
            personality_traits: raw.personality_traits.iter().collect(),
            lifestyle: non_blank(raw.lifestyle.as_deref()).map(str::to_string),
            tech_level: raw.tech_savviness.as_deref().and_then(TechLevel::from_label),
            gift_preference: non_blank(raw.gift_preference.as_deref()).map(str::to_string),
            budget,
            budget_bucket,
            tone,
            dislike_keywords,
            free_text_signals: tokenize(&free_text),
        })
    }
}

/// Parses a budget label.
///
/// `Under X` is `[0, X]`, `X-Y` is `[X, Y]`, `X+` is `[X, ∞)` and a bare `X` is `[X, X]`.
/// Currency symbols, thousands separators and whitespace are ignored.
pub fn parse_budget(raw: &str) -> Result<BudgetRange, ValidationError> {
    let invalid = || ValidationError::InvalidBudget { raw: raw.to_string() };
    let compact: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace() && !matches!(ch, '$' | '£' | '€' | '¥' | ','))
        .collect::<String>()
        .to_lowercase();

    let amount = |value: &str| -> Result<Decimal, ValidationError> {
        let parsed = Decimal::from_str(value).map_err(|_| invalid())?;
        if parsed.is_sign_negative() {
            return Err(invalid());
        }
        Ok(parsed)
    };

    if let Some(rest) = compact.strip_prefix("under") {
        return Ok(BudgetRange { min: Decimal::ZERO, max: Some(amount(rest)?) });
    }
    if let Some(rest) = compact.strip_suffix('+') {
        return Ok(BudgetRange { min: amount(rest)?, max: None });
    }
    if let Some((low, high)) = compact.split_once('-') {
        return bounded(amount(low)?, amount(high)?);
    }
    let exact = amount(&compact)?;
    Ok(BudgetRange { min: exact, max: Some(exact) })
}

/// Lowercases, strips punctuation and splits on whitespace, keeping the first occurrence
/// of each token. Short tokens and stop words are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    split_tokens(text, MIN_TOKEN_CHARS)
        .into_iter()
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
        .collect()
}

/// Dislike keywords: every token of two or more characters, stop words included.
pub fn dislike_tokens(text: &str) -> Vec<String> {
    split_tokens(text, MIN_DISLIKE_CHARS)
}

fn split_tokens(text: &str, min_chars: usize) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter_map(|ch| match ch {
            '-' | '/' | '_' => Some(' '),
            ch if ch.is_alphanumeric() || ch.is_whitespace() => Some(ch),
            _ => None,
        })
        .collect();

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() >= min_chars)
        .filter(|token| seen.insert(token.to_string()))
        .map(str::to_string)
        .collect()
}

fn numeric_budget(
    min: Option<Decimal>,
    max: Option<Decimal>,
) -> Result<Option<BudgetRange>, ValidationError> {
    if min.is_none() && max.is_none() {
        return Ok(None);
    }
    for value in [min, max].into_iter().flatten() {
        if value.is_sign_negative() {
            return Err(ValidationError::InvalidBudget { raw: value.to_string() });
        }
    }
    let min = min.unwrap_or(Decimal::ZERO);
    match max {
        Some(max) => bounded(min, max).map(Some),
        None => Ok(Some(BudgetRange { min, max: None })),
    }
}

fn bounded(min: Decimal, max: Decimal) -> Result<BudgetRange, ValidationError> {
    if min > max {
        return Err(ValidationError::InvertedBudget { min: min.to_string(), max: max.to_string() });
    }
    Ok(BudgetRange { min, max: Some(max) })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn required_tag(value: Option<&str>, field: &'static str) -> Result<Tag, ValidationError> {
    non_blank(value).and_then(Tag::new).ok_or(ValidationError::MissingField { field })
}

/// Resolves a closed-vocabulary value to its canonical spelling.
fn closed_tag(
    value: Option<&str>,
    vocabulary: &[&str],
    field: &'static str,
) -> Result<Option<Tag>, ValidationError> {
    let Some(value) = non_blank(value) else {
        return Ok(None);
    };
    vocabulary
        .iter()
        .filter_map(|known| Tag::new(known))
        .find(|known| known.matches(value))
        .map(Some)
        .ok_or_else(|| ValidationError::UnknownValue { field, value: value.to_string() })
}
