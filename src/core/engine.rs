use crate::models::{MatchNotification, MatchRecord, MatchResolution, RecipeSummary, SwipeOutcome, UserProfile};
use crate::ws::broadcaster::EventBroadcaster;
use crate::ws::messages::ServerEvent;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the user directory collaborator
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user not found: {0}")]
    NotFound(String),

    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the persistent match store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("match store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the content catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("recipe not found: {0}")]
    NotFound(String),

    #[error("content catalog unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the durable notification sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced to the caller of a swipe submission
///
/// `AlreadySwiped` leaves no state mutated, which is what makes retrying a
/// transient `Directory`/`Store` failure safe: a retry of an already-applied
/// swipe is rejected instead of double-counted.
#[derive(Debug, Error)]
pub enum SwipeError {
    #[error("recipe already swiped: {0}")]
    AlreadySwiped(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read/mutate access to user profiles and their swipe sets
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, DirectoryError>;

    /// Append the recipe to the user's liked or disliked set
    async fn record_preference(
        &self,
        user_id: &str,
        recipe_id: &str,
        liked: bool,
    ) -> Result<(), DirectoryError>;

    async fn increment_match_count(&self, user_id: &str) -> Result<(), DirectoryError>;
}

/// Read-only recipe display metadata
#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    async fn get_recipe(&self, recipe_id: &str) -> Result<RecipeSummary, CatalogError>;
}

/// Persistent match records with atomic create-if-absent semantics
///
/// Implementations must collapse concurrent creation attempts for the same
/// unordered pair and recipe into a single record; a losing attempt returns
/// the existing record with `created: false`. Never implemented as a
/// separate existence check followed by an insert.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn create_if_absent(
        &self,
        user_a: &str,
        user_b: &str,
        recipe_id: &str,
    ) -> Result<MatchResolution, StoreError>;
}

/// Durable, poll-able notifications for offline delivery
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn push(&self, notification: &MatchNotification) -> Result<(), SinkError>;
}

/// Swipe-and-match engine
///
/// Applies a (user, recipe, liked) event: records the preference, detects a
/// mutual like with the user's partner, creates the match exactly once, and
/// fans out notification to both sides.
pub struct SwipeEngine {
    directory: Arc<dyn UserDirectory>,
    catalog: Arc<dyn RecipeCatalog>,
    store: Arc<dyn MatchStore>,
    sink: Arc<dyn NotificationSink>,
    broadcaster: EventBroadcaster,
}

impl SwipeEngine {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        catalog: Arc<dyn RecipeCatalog>,
        store: Arc<dyn MatchStore>,
        sink: Arc<dyn NotificationSink>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            directory,
            catalog,
            store,
            sink,
            broadcaster,
        }
    }

    /// Record a swipe and resolve whether it completes a match
    ///
    /// # Errors
    /// `AlreadySwiped` if the user has a recorded preference for this recipe;
    /// `Directory`/`Store` for transient collaborator failures (safe to retry).
    pub async fn record_swipe(
        &self,
        user_id: &str,
        recipe_id: &str,
        liked: bool,
    ) -> Result<SwipeOutcome, SwipeError> {
        let profile = self.directory.get_profile(user_id).await?;

        // A swipe is one-time and irrevocable per (user, recipe).
        if profile.has_swiped(recipe_id) {
            return Err(SwipeError::AlreadySwiped(recipe_id.to_string()));
        }

        self.directory
            .record_preference(user_id, recipe_id, liked)
            .await?;

        if !liked {
            return Ok(SwipeOutcome::unmatched());
        }

        // Unpaired likes short-circuit; pairing is a precondition for
        // matching, not for swiping.
        let Some(partner_id) = profile.partner_id.as_deref() else {
            return Ok(SwipeOutcome::unmatched());
        };

        let partner = self.directory.get_profile(partner_id).await?;

        if !partner.likes(recipe_id) {
            // UX hint only; delivery to an offline partner is a no-op.
            self.broadcaster.send_to(
                partner_id,
                &ServerEvent::PartnerSwiping {
                    recipe_id: recipe_id.to_string(),
                    action: "liked".to_string(),
                },
            );
            return Ok(SwipeOutcome::unmatched());
        }

        // Both sides may reach this point concurrently; the store's
        // uniqueness constraint is the arbiter, not any in-process lock.
        let resolution = self
            .store
            .create_if_absent(user_id, partner_id, recipe_id)
            .await?;

        if resolution.created {
            info!(
                "Match created: {} for pair ({}, {}) on recipe {}",
                resolution.record.id, resolution.record.user_a, resolution.record.user_b, recipe_id
            );
        } else {
            debug!(
                "Match creation lost the race, reusing existing match {}",
                resolution.record.id
            );
        }

        let recipe = self.resolve_recipe(recipe_id).await;
        self.fan_out(&resolution.record, recipe, user_id, partner_id)
            .await;

        Ok(SwipeOutcome::matched(resolution.record.id))
    }

    /// Fetch recipe metadata for the match payload, degrading to a bare id
    /// when the catalog is unreachable
    async fn resolve_recipe(&self, recipe_id: &str) -> RecipeSummary {
        match self.catalog.get_recipe(recipe_id).await {
            Ok(recipe) => recipe,
            Err(e) => {
                warn!("Failed to resolve recipe {} for match payload: {}", recipe_id, e);
                RecipeSummary::unresolved(recipe_id)
            }
        }
    }

    /// Best-effort post-match work: statistics, durable notifications, and
    /// the real-time push to whichever partners are online
    async fn fan_out(
        &self,
        record: &MatchRecord,
        recipe: RecipeSummary,
        user_id: &str,
        partner_id: &str,
    ) {
        for id in [user_id, partner_id] {
            if let Err(e) = self.directory.increment_match_count(id).await {
                warn!("Failed to increment match count for {}: {}", id, e);
            }

            let notification = MatchNotification {
                user_id: id.to_string(),
                match_id: record.id,
                recipe_id: record.recipe_id.clone(),
                created_at: record.matched_at,
            };
            if let Err(e) = self.sink.push(&notification).await {
                warn!("Failed to record notification for {}: {}", id, e);
            }
        }

        let event = ServerEvent::NewMatch {
            match_id: record.id,
            recipe,
        };
        let delivered = self.broadcaster.send_to_pair(user_id, partner_id, &event);
        debug!(
            "Match {} push delivered to at least one side: {}",
            record.id, delivered
        );
    }
}
