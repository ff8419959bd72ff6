use crate::core::{CatalogError, RecipeCatalog};
use crate::models::RecipeSummary;
use crate::services::AppwriteClient;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// In-process cache for recipe display metadata
///
/// Recipe metadata is read-only from this core's perspective, so a TTL'd
/// in-memory tier in front of the catalog is safe. Wraps the Appwrite
/// catalog lookup and is used wherever a `RecipeCatalog` is expected.
pub struct RecipeCache {
    appwrite: Arc<AppwriteClient>,
    cache: moka::future::Cache<String, RecipeSummary>,
}

impl RecipeCache {
    pub fn new(appwrite: Arc<AppwriteClient>, capacity: u64, ttl_secs: u64) -> Self {
        let cache = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { appwrite, cache }
    }

    async fn lookup(&self, recipe_id: &str) -> Result<RecipeSummary, CatalogError> {
        let key = CacheKey::recipe(recipe_id);

        if let Some(recipe) = self.cache.get(&key).await {
            tracing::trace!("Recipe cache hit: {}", key);
            return Ok(recipe);
        }

        tracing::trace!("Recipe cache miss: {}", key);
        let recipe = self.appwrite.get_recipe_summary(recipe_id).await?;
        self.cache.insert(key, recipe.clone()).await;

        Ok(recipe)
    }
}

#[async_trait]
impl RecipeCatalog for RecipeCache {
    async fn get_recipe(&self, recipe_id: &str) -> Result<RecipeSummary, CatalogError> {
        self.lookup(recipe_id).await
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for recipe metadata
    pub fn recipe(recipe_id: &str) -> String {
        format!("recipe:{}", recipe_id)
    }
}
