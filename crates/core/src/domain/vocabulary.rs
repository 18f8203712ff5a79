//! Shared facet vocabulary.
//!
//! Both the profile normalizer and the catalog stores build facet values through
//! [`Tag`], so a recipient's "Best Friend" and a product's "best  friend" compare equal.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reference occasions offered by the recipient form. Occasions stay an open vocabulary.
pub const KNOWN_OCCASIONS: &[&str] = &[
    "Birthday",
    "Anniversary",
    "Christmas",
    "Valentine's Day",
    "Mother's Day",
    "Father's Day",
    "Graduation",
    "Wedding",
    "Housewarming",
    "Promotion",
    "Retirement",
    "Baby Shower",
    "Just Because",
    "Thank You",
    "Apology",
];

/// Reference relationships offered by the recipient form. Relationships stay open.
pub const KNOWN_RELATIONSHIPS: &[&str] = &[
    "Husband",
    "Wife",
    "Boyfriend",
    "Girlfriend",
    "Best Friend",
    "Close Friend",
    "Friend",
    "Family Member",
    "Mother",
    "Father",
    "Sister",
    "Brother",
    "Daughter",
    "Son",
    "Colleague",
    "Boss",
    "Acquaintance",
    "Teacher",
    "Neighbor",
];

pub const AGE_GROUPS: &[&str] = &["Under 18", "18-25", "26-35", "36-45", "46-55", "56-65", "Over 65"];

pub const GENDERS: &[&str] = &["Male", "Female", "Non-binary", "Prefer not to say"];

/// Catalog-only gender value meaning "suitable for anyone".
pub const ANY_GENDER: &str = "Any";

/// A facet value compared case-insensitively.
///
/// The key is the trimmed, lowercased label with inner whitespace collapsed; the label
/// keeps the caller's spelling for display.
#[derive(Clone, Debug)]
pub struct Tag {
    key: String,
    label: String,
}

impl Tag {
    /// Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let label = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if label.is_empty() {
            return None;
        }
        Some(Self { key: label.to_lowercase(), label })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matches(&self, raw: &str) -> bool {
        Tag::new(raw).is_some_and(|other| other.key == self.key)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Tag::new(&raw).ok_or_else(|| serde::de::Error::custom("facet value must not be blank"))
    }
}

/// Set of facet values with case-insensitive dedup. The first spelling seen wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value; blank values and case-insensitive duplicates are ignored.
    pub fn insert(&mut self, raw: &str) -> bool {
        match Tag::new(raw) {
            Some(tag) => self.0.insert(tag),
            None => false,
        }
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|tag| tag.key() == key)
    }

    pub fn intersection<'a>(&'a self, other: &'a TagSet) -> impl Iterator<Item = &'a Tag> + 'a {
        self.0.intersection(&other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(|tag| tag.label().to_string()).collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for value in iter {
            set.insert(value.as_ref());
        }
        set
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw.iter().collect())
    }
}

/// Closed set of price buckets shared by recipient budgets and product `price_ranges`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBucket {
    Under25,
    From25To50,
    From50To100,
    From100To200,
    Over200,
}

impl PriceBucket {
    pub const ALL: [PriceBucket; 5] = [
        PriceBucket::Under25,
        PriceBucket::From25To50,
        PriceBucket::From50To100,
        PriceBucket::From100To200,
        PriceBucket::Over200,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PriceBucket::Under25 => "Under $25",
            PriceBucket::From25To50 => "$25-50",
            PriceBucket::From50To100 => "$50-100",
            PriceBucket::From100To200 => "$100-200",
            PriceBucket::Over200 => "$200+",
        }
    }

    /// Matches a label ignoring case and whitespace, so "under $25" and "$25 - 50" resolve.
    pub fn from_label(raw: &str) -> Option<Self> {
        let compact: String =
            raw.chars().filter(|ch| !ch.is_whitespace()).collect::<String>().to_lowercase();
        Self::ALL.into_iter().find(|bucket| {
            let label: String = bucket.label().chars().filter(|ch| !ch.is_whitespace()).collect();
            label.to_lowercase() == compact
        })
    }

    /// Bucket a catalog price falls into; lower bounds are inclusive.
    pub fn for_price(price: Decimal) -> Self {
        if price < Decimal::from(25) {
            PriceBucket::Under25
        } else if price < Decimal::from(50) {
            PriceBucket::From25To50
        } else if price < Decimal::from(100) {
            PriceBucket::From50To100
        } else if price < Decimal::from(200) {
            PriceBucket::From100To200
        } else {
            PriceBucket::Over200
        }
    }

    pub fn tag(&self) -> Tag {
        Tag { key: self.label().to_lowercase(), label: self.label().to_string() }
    }
}

/// Message tone. Closed; anything unrecognised is treated as [`Tone::Sincere`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Funny,
    Romantic,
    #[default]
    Sincere,
    Casual,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Funny, Tone::Romantic, Tone::Sincere, Tone::Casual];

    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "funny" => Tone::Funny,
            "romantic" => Tone::Romantic,
            "casual" => Tone::Casual,
            _ => Tone::Sincere,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tone::Funny => "Funny",
            Tone::Romantic => "Romantic",
            Tone::Sincere => "Sincere",
            Tone::Casual => "Casual",
        }
    }
}

/// How comfortable the recipient is with technology, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechLevel {
    None,
    Basic,
    Moderate,
    High,
    EarlyAdopter,
}

impl TechLevel {
    pub fn from_label(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return None;
        }
        if normalized.starts_with("not") {
            Some(TechLevel::None)
        } else if normalized.starts_with("basic") {
            Some(TechLevel::Basic)
        } else if normalized.starts_with("moderate") {
            Some(TechLevel::Moderate)
        } else if normalized.starts_with("very") {
            Some(TechLevel::High)
        } else if normalized.contains("enthusiast") || normalized.contains("early adopter") {
            Some(TechLevel::EarlyAdopter)
        } else {
            None
        }
    }

    pub fn ordinal(&self) -> u8 {
        *self as u8
    }
}

pub fn is_known_age_group(raw: &str) -> bool {
    AGE_GROUPS.iter().any(|group| Tag::new(group).is_some_and(|tag| tag.matches(raw)))
}

/// Recipient-side gender check; the catalog wildcard is not a valid recipient gender.
pub fn is_known_gender(raw: &str) -> bool {
    GENDERS.iter().any(|gender| Tag::new(gender).is_some_and(|tag| tag.matches(raw)))
}

/// Catalog-side gender check, which also accepts the wildcard.
pub fn is_catalog_gender(raw: &str) -> bool {
    is_known_gender(raw) || raw.trim().eq_ignore_ascii_case(ANY_GENDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_compare_case_and_whitespace_insensitively() {
        let a = Tag::new("  Best   Friend ").expect("tag");
        let b = Tag::new("best friend").expect("tag");

        assert_eq!(a, b);
        assert_eq!(a.label(), "Best Friend");
        assert_eq!(a.key(), "best friend");
        assert!(Tag::new("   ").is_none());
    }

    #[test]
    fn tag_set_dedups_and_keeps_first_spelling() {
        let set: TagSet = ["Gaming", "gaming", "GAMING", " Reading", ""].into_iter().collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.labels(), vec!["Gaming".to_string(), "Reading".to_string()]);
    }

    #[test]
    fn tag_set_intersection_counts_shared_values() {
        let a: TagSet = ["Gaming", "Music", "Travel"].into_iter().collect();
        let b: TagSet = ["music", "travel", "cooking"].into_iter().collect();

        assert_eq!(a.intersection(&b).count(), 2);
    }

    #[test]
    fn price_bucket_labels_round_trip_loosely() {
        assert_eq!(PriceBucket::from_label("under $25"), Some(PriceBucket::Under25));
        assert_eq!(PriceBucket::from_label("$25 - 50"), Some(PriceBucket::From25To50));
        assert_eq!(PriceBucket::from_label("$200+"), Some(PriceBucket::Over200));
        assert_eq!(PriceBucket::from_label("$75"), None);
    }

    #[test]
    fn price_bucket_for_price_uses_inclusive_lower_bounds() {
        assert_eq!(PriceBucket::for_price(Decimal::new(2499, 2)), PriceBucket::Under25);
        assert_eq!(PriceBucket::for_price(Decimal::from(25)), PriceBucket::From25To50);
        assert_eq!(PriceBucket::for_price(Decimal::from(200)), PriceBucket::Over200);
    }

    #[test]
    fn unknown_tones_fall_back_to_sincere() {
        assert_eq!(Tone::from_label("Funny"), Tone::Funny);
        assert_eq!(Tone::from_label(" romantic "), Tone::Romantic);
        assert_eq!(Tone::from_label("Witty"), Tone::Sincere);
        assert_eq!(Tone::from_label(""), Tone::Sincere);
    }

    #[test]
    fn tech_levels_parse_form_labels_in_order() {
        assert_eq!(TechLevel::from_label("Not tech-savvy at all"), Some(TechLevel::None));
        assert_eq!(TechLevel::from_label("Very tech-savvy"), Some(TechLevel::High));
        assert_eq!(
            TechLevel::from_label("Tech enthusiast/Early adopter"),
            Some(TechLevel::EarlyAdopter)
        );
        assert!(TechLevel::Basic < TechLevel::Moderate);
        assert_eq!(TechLevel::from_label("???"), None);
    }

    #[test]
    fn gender_vocabulary_separates_recipient_and_catalog_values() {
        assert!(is_known_gender("female"));
        assert!(!is_known_gender("Any"));
        assert!(is_catalog_gender("any"));
        assert!(is_known_age_group("18-25"));
        assert!(!is_known_age_group("teen"));
    }
}
