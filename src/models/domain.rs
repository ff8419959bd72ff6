use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User profile as stored in the user directory
///
/// The directory owns this record; this service only reads it and appends to
/// the two swipe sets. An item id appears in at most one of the two sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Symmetric pairing: if A.partner_id = B then B.partner_id = A
    #[serde(default)]
    pub partner_id: Option<String>,
    #[serde(default)]
    pub liked_recipe_ids: Vec<String>,
    #[serde(default)]
    pub disliked_recipe_ids: Vec<String>,
    #[serde(default)]
    pub match_count: u32,
}

impl UserProfile {
    /// Whether the user has already recorded a preference for this recipe
    pub fn has_swiped(&self, recipe_id: &str) -> bool {
        self.liked_recipe_ids.iter().any(|id| id == recipe_id)
            || self.disliked_recipe_ids.iter().any(|id| id == recipe_id)
    }

    /// Whether the user's liked set contains this recipe
    pub fn likes(&self, recipe_id: &str) -> bool {
        self.liked_recipe_ids.iter().any(|id| id == recipe_id)
    }
}

/// Minimal recipe display metadata from the content catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub recipe_id: String,
    pub title: String,
    #[serde(default)]
    pub image_file_id: Option<String>,
}

impl RecipeSummary {
    /// Placeholder used when the catalog is unreachable; the match itself is
    /// already durable at that point, only the push payload degrades.
    pub fn unresolved(recipe_id: &str) -> Self {
        Self {
            recipe_id: recipe_id.to_string(),
            title: String::new(),
            image_file_id: None,
        }
    }
}

/// A persisted match between a user pair and a recipe
///
/// `user_a` < `user_b` lexicographically; together with `recipe_id` the pair
/// key identifies the match, and at most one record may ever exist for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: Uuid,
    pub user_a: String,
    pub user_b: String,
    pub recipe_id: String,
    pub status: String,
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of a create-if-absent attempt against the match store
#[derive(Debug, Clone)]
pub struct MatchResolution {
    pub record: MatchRecord,
    /// False when this attempt lost the race and the record already existed
    pub created: bool,
}

/// Result of a swipe submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeOutcome {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
}

impl SwipeOutcome {
    pub fn unmatched() -> Self {
        Self { matched: false, match_id: None }
    }

    pub fn matched(match_id: Uuid) -> Self {
        Self { matched: true, match_id: Some(match_id) }
    }
}

/// Durable notification written to the poll-able sink on a new match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchNotification {
    pub user_id: String,
    pub match_id: Uuid,
    pub recipe_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
