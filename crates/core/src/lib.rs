pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod matching;
pub mod service;

pub use catalog::{BrowseQuery, CatalogError, CatalogStore};
pub use domain::product::{MatchFacets, Product, ProductId};
pub use domain::profile::{BudgetRange, RecipientProfile};
pub use domain::vocabulary::{PriceBucket, Tag, TagSet, TechLevel, Tone};
pub use errors::{ApplicationError, DomainError, InterfaceError, ValidationError};
pub use matching::{MatchResult, MatchingEngine, ProfileNormalizer, RawRecipientInput};
pub use service::{MessageRequest, NextSuggestionRequest, SuggestionRequest, SuggestionService};
