mod config;
mod core;
mod models;
mod routes;
mod services;
mod ws;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use crate::config::Settings;
use crate::core::SwipeEngine;
use crate::routes::AppState;
use crate::services::{AppwriteClient, AppwriteCollections, PostgresClient, RecipeCache};
use crate::ws::{ConnectionRegistry, EventBroadcaster};
use std::sync::Arc;
use tracing::{error, info};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting PairPlate presence and match service...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize Appwrite client (user directory, catalog, auth, notifications)
    let appwrite_collections = AppwriteCollections {
        user_profiles: settings.collection.user_profiles,
        recipes: settings.collection.recipes,
        notifications: settings.collection.notifications,
    };

    let appwrite = Arc::new(AppwriteClient::new(
        settings.appwrite.endpoint,
        settings.appwrite.api_key,
        settings.appwrite.project_id,
        settings.appwrite.database_id,
        appwrite_collections,
    ));

    info!("Appwrite client initialized");

    // Recipe metadata cache in front of the catalog
    let recipe_capacity = settings.cache.recipe_capacity.unwrap_or(1000);
    let recipe_ttl = settings.cache.recipe_ttl_secs.unwrap_or(300);
    let catalog = Arc::new(RecipeCache::new(
        Arc::clone(&appwrite),
        recipe_capacity,
        recipe_ttl,
    ));

    info!("Recipe cache initialized ({} entries, TTL: {}s)", recipe_capacity, recipe_ttl);

    // Initialize PostgreSQL match store
    let db_max_conn = settings.database.max_connections.unwrap_or(10);
    let db_min_conn = settings.database.min_connections.unwrap_or(1);

    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            Some(db_max_conn),
            Some(db_min_conn),
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .unwrap_or_else(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            panic!("PostgreSQL connection error: {}", e);
        }),
    );

    info!("PostgreSQL match store initialized (max: {} connections)", db_max_conn);

    // Connection registry and broadcaster, shared across all connections
    let registry = Arc::new(ConnectionRegistry::new());
    let broadcaster = EventBroadcaster::new(Arc::clone(&registry));

    // Swipe-and-match engine
    let engine = Arc::new(SwipeEngine::new(
        Arc::clone(&appwrite) as Arc<dyn crate::core::UserDirectory>,
        catalog,
        Arc::clone(&postgres) as Arc<dyn crate::core::MatchStore>,
        Arc::clone(&appwrite) as Arc<dyn crate::core::NotificationSink>,
        broadcaster.clone(),
    ));

    info!(
        "Swipe engine initialized (liveness interval: {}s)",
        settings.presence.ping_interval_secs
    );

    // Build application state
    let app_state = AppState {
        directory: Arc::clone(&appwrite) as Arc<dyn crate::core::UserDirectory>,
        verifier: Arc::clone(&appwrite) as Arc<dyn crate::services::SessionVerifier>,
        registry,
        broadcaster,
        engine,
        postgres,
        presence: settings.presence.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(crate::routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
