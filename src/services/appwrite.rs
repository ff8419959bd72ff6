use crate::core::{
    CatalogError, DirectoryError, NotificationSink, SinkError, UserDirectory,
};
use crate::models::{MatchNotification, RecipeSummary, UserProfile};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<AppwriteError> for DirectoryError {
    fn from(err: AppwriteError) -> Self {
        match err {
            AppwriteError::NotFound(what) => DirectoryError::NotFound(what),
            other => DirectoryError::Unavailable(other.to_string()),
        }
    }
}

impl From<AppwriteError> for CatalogError {
    fn from(err: AppwriteError) -> Self {
        match err {
            AppwriteError::NotFound(what) => CatalogError::NotFound(what),
            other => CatalogError::Unavailable(other.to_string()),
        }
    }
}

impl From<AppwriteError> for SinkError {
    fn from(err: AppwriteError) -> Self {
        SinkError::Unavailable(err.to_string())
    }
}

/// Verification of a bearer credential into a stable user identity
///
/// The credential is opaque to this service; the authentication collaborator
/// owns its format and lifetime.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, AppwriteError>;
}

/// Appwrite API client
///
/// Handles all communication with the Appwrite backend including:
/// - Fetching user profiles and their swipe sets
/// - Appending swipe preferences and match statistics
/// - Fetching recipe display metadata
/// - Recording durable match notifications
/// - Verifying bearer credentials against the account endpoint
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub user_profiles: String,
    pub recipes: String,
    pub notifications: String,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        }
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    /// Fetch the first document matching an attribute equality query
    ///
    /// Returns the Appwrite document id together with its data payload; the
    /// id is needed for subsequent PATCH mutations.
    async fn find_document(
        &self,
        collection: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(String, Value), AppwriteError> {
        let query_json = format!(r#"["{}={}"]"#, attribute, value);
        let encoded_query = urlencoding::encode(&query_json);
        let url = format!("{}?query={}", self.documents_url(collection), encoded_query);

        tracing::debug!("Fetching document from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppwriteError::ApiError(format!(
                "Failed to fetch document: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))?;

        let doc = documents.first().ok_or_else(|| {
            AppwriteError::NotFound(format!("{} not found for {}={}", collection, attribute, value))
        })?;

        let doc_id = doc
            .get("$id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing document id".into()))?
            .to_string();

        let data = doc.get("data").unwrap_or(doc).clone();

        Ok((doc_id, data))
    }

    /// Patch selected fields of an existing document
    async fn update_document(
        &self,
        collection: &str,
        doc_id: &str,
        data: Value,
    ) -> Result<(), AppwriteError> {
        let url = format!("{}/{}", self.documents_url(collection), doc_id);

        let response = self
            .client
            .patch(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .json(&serde_json::json!({ "data": data }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppwriteError::ApiError(format!(
                "Failed to update document: {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Fetch a user profile together with its backing document id
    async fn get_profile_document(
        &self,
        user_id: &str,
    ) -> Result<(String, UserProfile), AppwriteError> {
        let (doc_id, data) = self
            .find_document(&self.collections.user_profiles, "userId", user_id)
            .await?;

        let profile = serde_json::from_value(data)
            .map_err(|e| AppwriteError::InvalidResponse(format!("Failed to parse profile: {}", e)))?;

        Ok((doc_id, profile))
    }

    /// Get a single profile by user ID
    pub async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, AppwriteError> {
        let (_, profile) = self.get_profile_document(user_id).await?;
        Ok(profile)
    }

    /// Append a recipe to the user's liked or disliked set
    pub async fn append_preference(
        &self,
        user_id: &str,
        recipe_id: &str,
        liked: bool,
    ) -> Result<(), AppwriteError> {
        let (doc_id, mut profile) = self.get_profile_document(user_id).await?;

        let (field, set) = if liked {
            ("likedRecipeIds", &mut profile.liked_recipe_ids)
        } else {
            ("dislikedRecipeIds", &mut profile.disliked_recipe_ids)
        };
        if !set.iter().any(|id| id == recipe_id) {
            set.push(recipe_id.to_string());
        }

        self.update_document(
            &self.collections.user_profiles,
            &doc_id,
            serde_json::json!({ field: set }),
        )
        .await?;

        tracing::debug!("Recorded preference: {} {} {}", user_id, if liked { "liked" } else { "disliked" }, recipe_id);

        Ok(())
    }

    /// Increment the user's match counter (best-effort statistic)
    pub async fn bump_match_count(&self, user_id: &str) -> Result<(), AppwriteError> {
        let (doc_id, profile) = self.get_profile_document(user_id).await?;

        self.update_document(
            &self.collections.user_profiles,
            &doc_id,
            serde_json::json!({ "matchCount": profile.match_count + 1 }),
        )
        .await
    }

    /// Fetch recipe display metadata by recipe ID
    pub async fn get_recipe_summary(&self, recipe_id: &str) -> Result<RecipeSummary, AppwriteError> {
        let (_, data) = self
            .find_document(&self.collections.recipes, "recipeId", recipe_id)
            .await?;

        serde_json::from_value(data)
            .map_err(|e| AppwriteError::InvalidResponse(format!("Failed to parse recipe: {}", e)))
    }

    /// Record a durable match notification for offline delivery
    pub async fn create_notification(
        &self,
        notification: &MatchNotification,
    ) -> Result<(), AppwriteError> {
        let url = self.documents_url(&self.collections.notifications);

        let mut payload = serde_json::to_value(notification)
            .map_err(|e| AppwriteError::InvalidResponse(e.to_string()))?;
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("$id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        }

        let response = self
            .client
            .post(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppwriteError::ApiError(format!(
                "Failed to record notification: {}",
                response.status()
            )));
        }

        tracing::debug!(
            "Recorded notification for {} (match {})",
            notification.user_id,
            notification.match_id
        );

        Ok(())
    }

    /// Exchange a bearer credential for the account's user id
    pub async fn verify_session(&self, token: &str) -> Result<String, AppwriteError> {
        let url = format!("{}/account", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-JWT", token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppwriteError::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(AppwriteError::ApiError(format!(
                "Failed to verify session: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        json.get("$id")
            .and_then(|id| id.as_str())
            .map(|id| id.to_string())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing account id".into()))
    }
}

#[async_trait]
impl UserDirectory for AppwriteClient {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, DirectoryError> {
        Ok(self.get_user_profile(user_id).await?)
    }

    async fn record_preference(
        &self,
        user_id: &str,
        recipe_id: &str,
        liked: bool,
    ) -> Result<(), DirectoryError> {
        Ok(self.append_preference(user_id, recipe_id, liked).await?)
    }

    async fn increment_match_count(&self, user_id: &str) -> Result<(), DirectoryError> {
        Ok(self.bump_match_count(user_id).await?)
    }
}

#[async_trait]
impl NotificationSink for AppwriteClient {
    async fn push(&self, notification: &MatchNotification) -> Result<(), SinkError> {
        Ok(self.create_notification(notification).await?)
    }
}

#[async_trait]
impl SessionVerifier for AppwriteClient {
    async fn verify(&self, token: &str) -> Result<String, AppwriteError> {
        self.verify_session(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base_url: String) -> AppwriteClient {
        AppwriteClient::new(
            base_url,
            "test_key".to_string(),
            "test_project".to_string(),
            "test_db".to_string(),
            AppwriteCollections {
                user_profiles: "user_profiles".to_string(),
                recipes: "recipes".to_string(),
                notifications: "notifications".to_string(),
            },
        )
    }

    #[test]
    fn test_appwrite_client_creation() {
        let client = client_for("https://appwrite.test/v1".to_string());

        assert_eq!(client.base_url, "https://appwrite.test/v1");
        assert_eq!(client.api_key, "test_key");
    }

    #[tokio::test]
    async fn test_verify_session_rejects_invalid_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/account")
            .with_status(401)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client.verify_session("expired").await.unwrap_err();
        assert!(matches!(err, AppwriteError::Unauthorized));
    }

    #[tokio::test]
    async fn test_verify_session_resolves_account_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/account")
            .match_header("x-appwrite-jwt", "session-token")
            .with_status(200)
            .with_body(r#"{"$id": "u1", "email": "anna@example.com"}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let user_id = client.verify_session("session-token").await.unwrap();
        assert_eq!(user_id, "u1");
    }

    #[tokio::test]
    async fn test_get_user_profile_parses_document() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock(
                "GET",
                "/databases/test_db/collections/user_profiles/documents",
            )
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"documents": [{"$id": "doc1", "userId": "u1", "partnerId": "u2", "likedRecipeIds": ["r1"]}]}"#,
            )
            .create_async()
            .await;

        let client = client_for(server.url());
        let profile = client.get_user_profile("u1").await.unwrap();
        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.partner_id.as_deref(), Some("u2"));
        assert!(profile.likes("r1"));
    }

    #[tokio::test]
    async fn test_get_user_profile_missing_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock(
                "GET",
                "/databases/test_db/collections/user_profiles/documents",
            )
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"documents": []}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client.get_user_profile("missing").await.unwrap_err();
        assert!(matches!(err, AppwriteError::NotFound(_)));
    }

    #[test]
    fn test_documents_url_trims_trailing_slash() {
        let collections = AppwriteCollections {
            user_profiles: "user_profiles".to_string(),
            recipes: "recipes".to_string(),
            notifications: "notifications".to_string(),
        };

        let client = AppwriteClient::new(
            "https://appwrite.test/v1/".to_string(),
            "k".to_string(),
            "p".to_string(),
            "db".to_string(),
            collections,
        );

        assert_eq!(
            client.documents_url("recipes"),
            "https://appwrite.test/v1/databases/db/collections/recipes/documents"
        );
    }

    #[test]
    fn test_error_mapping_preserves_not_found() {
        let err: DirectoryError = AppwriteError::NotFound("user u1".to_string()).into();
        assert!(matches!(err, DirectoryError::NotFound(_)));

        let err: DirectoryError = AppwriteError::Unauthorized.into();
        assert!(matches!(err, DirectoryError::Unavailable(_)));
    }
}
