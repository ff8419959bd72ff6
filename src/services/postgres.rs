use crate::core::{pair_key, ordered_pair, MatchStore, StoreError};
use crate::models::{MatchRecord, MatchResolution};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<PostgresError> for StoreError {
    fn from(err: PostgresError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// PostgreSQL client for the persistent match store
///
/// Match identity is the normalized (pair_key, recipe_id) tuple; a unique
/// index on it makes creation atomic under concurrent submissions from both
/// partners, with no in-process locking between their decision points.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a client whose pool connects on first use
    ///
    /// Migrations are not run; `new` is the startup path.
    pub fn new_lazy(database_url: &str) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        _acquire_timeout_secs: Option<u64>,
        _idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL with URL: {}", url);

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Create the match record for an unordered pair and recipe, or return
    /// the existing one
    ///
    /// `INSERT .. ON CONFLICT DO NOTHING` makes the create side atomic; the
    /// losing attempt reads the winner's row back. Matches are never deleted,
    /// so the read-back cannot miss.
    pub async fn create_match_if_absent(
        &self,
        first: &str,
        second: &str,
        recipe_id: &str,
    ) -> Result<MatchResolution, PostgresError> {
        let (user_a, user_b) = ordered_pair(first, second);
        let key = pair_key(first, second);

        let insert = r#"
            INSERT INTO recipe_matches (id, pair_key, user_a, user_b, recipe_id, status, matched_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', NOW())
            ON CONFLICT (pair_key, recipe_id) DO NOTHING
            RETURNING id, user_a, user_b, recipe_id, status, matched_at
        "#;

        let inserted = sqlx::query(insert)
            .bind(Uuid::new_v4())
            .bind(&key)
            .bind(user_a)
            .bind(user_b)
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok(MatchResolution {
                record: row_to_record(&row),
                created: true,
            });
        }

        let select = r#"
            SELECT id, user_a, user_b, recipe_id, status, matched_at
            FROM recipe_matches
            WHERE pair_key = $1 AND recipe_id = $2
        "#;

        let row = sqlx::query(select)
            .bind(&key)
            .bind(recipe_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(MatchResolution {
            record: row_to_record(&row),
            created: false,
        })
    }

    /// Look up a match by id
    pub async fn get_match(&self, id: Uuid) -> Result<MatchRecord, PostgresError> {
        let query = r#"
            SELECT id, user_a, user_b, recipe_id, status, matched_at
            FROM recipe_matches
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("match {}", id)))?;

        Ok(row_to_record(&row))
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn row_to_record(row: &PgRow) -> MatchRecord {
    MatchRecord {
        id: row.get("id"),
        user_a: row.get("user_a"),
        user_b: row.get("user_b"),
        recipe_id: row.get("recipe_id"),
        status: row.get("status"),
        matched_at: row.get("matched_at"),
    }
}

#[async_trait]
impl MatchStore for PostgresClient {
    async fn create_if_absent(
        &self,
        user_a: &str,
        user_b: &str,
        recipe_id: &str,
    ) -> Result<MatchResolution, StoreError> {
        Ok(self.create_match_if_absent(user_a, user_b, recipe_id).await?)
    }
}
