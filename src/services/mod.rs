// Service exports
pub mod appwrite;
pub mod cache;
pub mod postgres;

pub use appwrite::{AppwriteClient, AppwriteCollections, AppwriteError, SessionVerifier};
pub use cache::{CacheKey, RecipeCache};
pub use postgres::{PostgresClient, PostgresError};
