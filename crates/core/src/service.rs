//! Suggestion flows shared by the HTTP API and the CLI.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{browse, BrowseQuery, CatalogStore};
use crate::config::MatchingConfig;
use crate::domain::product::{Product, ProductId};
use crate::domain::profile::RecipientProfile;
use crate::errors::ApplicationError;
use crate::matching::{
    MatchResult, MatchingEngine, ProfileNormalizer, RawRecipientInput, SINGLE_SUGGESTION_LIMIT,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestionRequest {
    pub profile: RawRecipientInput,
    pub exclude_ids: Vec<ProductId>,
    pub top_n: Option<usize>,
}

/// "Try another": `attempt` counts the retries made so far, this one included.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NextSuggestionRequest {
    pub profile: RawRecipientInput,
    pub exclude_ids: Vec<ProductId>,
    pub attempt: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub profile: RawRecipientInput,
    pub product_id: ProductId,
}

#[derive(Clone)]
pub struct SuggestionService {
    store: Arc<dyn CatalogStore>,
    engine: Arc<MatchingEngine>,
    normalizer: ProfileNormalizer,
    browse_limit: usize,
    max_retries: u32,
}

impl SuggestionService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        matching: &MatchingConfig,
    ) -> Result<Self, ApplicationError> {
        let engine = MatchingEngine::new(matching.weights, matching.max_per_category)?;
        Ok(Self {
            store,
            engine: Arc::new(engine),
            normalizer: ProfileNormalizer::new(),
            browse_limit: matching.browse_limit,
            max_retries: matching.max_retries,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Browse-style suggestions with a message for the top pick.
    pub async fn suggest<R: Rng + Send + ?Sized>(
        &self,
        request: &SuggestionRequest,
        rng: &mut R,
    ) -> Result<MatchResult, ApplicationError> {
        let profile = self.normalize(&request.profile)?;
        let catalog = self.snapshot().await?;
        let top_n = request.top_n.filter(|top_n| *top_n > 0).unwrap_or(self.browse_limit);
        let exclude: HashSet<ProductId> = request.exclude_ids.iter().cloned().collect();

        let result = self.engine.get_suggestions(&profile, &catalog, &exclude, top_n, rng)?;
        debug!(
            returned = result.ranked.len(),
            fallback_used = result.fallback_used,
            "suggestions ranked"
        );
        Ok(result)
    }

    /// Single replacement suggestion, bounded by the configured retry limit.
    pub async fn next_suggestion<R: Rng + Send + ?Sized>(
        &self,
        request: &NextSuggestionRequest,
        rng: &mut R,
    ) -> Result<MatchResult, ApplicationError> {
        if request.attempt > self.max_retries {
            return Err(ApplicationError::RetryLimitExceeded {
                attempt: request.attempt,
                max_retries: self.max_retries,
            });
        }

        let profile = self.normalize(&request.profile)?;
        let catalog = self.snapshot().await?;
        if catalog.is_empty() {
            return Err(ApplicationError::EmptyCatalog);
        }
        let exclude: HashSet<ProductId> = request.exclude_ids.iter().cloned().collect();

        self.engine.get_suggestions(&profile, &catalog, &exclude, SINGLE_SUGGESTION_LIMIT, rng)
    }

    /// Fresh message for a product already shown to the user.
    pub async fn message<R: Rng + Send + ?Sized>(
        &self,
        request: &MessageRequest,
        rng: &mut R,
    ) -> Result<String, ApplicationError> {
        let profile = self.normalize(&request.profile)?;
        let catalog = self.snapshot().await?;
        let product = catalog
            .iter()
            .find(|product| product.id == request.product_id)
            .ok_or_else(|| ApplicationError::ProductNotFound(request.product_id.0.clone()))?;

        self.engine.get_message(&profile, product, rng)
    }

    pub async fn browse(&self, query: &BrowseQuery) -> Result<Vec<Product>, ApplicationError> {
        Ok(browse(self.snapshot().await?, query))
    }

    fn normalize(&self, raw: &RawRecipientInput) -> Result<RecipientProfile, ApplicationError> {
        Ok(self.normalizer.normalize(raw)?)
    }

    async fn snapshot(&self) -> Result<Vec<Product>, ApplicationError> {
        self.store
            .list_active_products()
            .await
            .map_err(|error| ApplicationError::Catalog(error.to_string()))
    }
}
