use crate::config::PresenceSettings;
use crate::core::{DirectoryError, SwipeEngine, UserDirectory};
use crate::models::{ErrorResponse, HealthResponse, PresenceResponse};
use crate::services::{AppwriteError, PostgresClient, SessionVerifier};
use crate::ws::{ConnectionRegistry, EventBroadcaster, WsSession};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use actix_web_actors::ws;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn UserDirectory>,
    pub verifier: Arc<dyn SessionVerifier>,
    pub registry: Arc<ConnectionRegistry>,
    pub broadcaster: EventBroadcaster,
    pub engine: Arc<SwipeEngine>,
    pub postgres: Arc<PostgresClient>,
    pub presence: PresenceSettings,
}

/// Configure all channel-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/ws", web::get().to(ws_entry))
        .route("/debug/presence", web::get().to(debug_presence));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    // Check PostgreSQL health
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Debug view of the connection registry
///
/// GET /api/v1/debug/presence
async fn debug_presence(state: web::Data<AppState>) -> impl Responder {
    let online = state.registry.list_online();
    let count = online.len();

    HttpResponse::Ok().json(PresenceResponse { online, count })
}

/// Real-time channel handshake
///
/// GET /api/v1/ws
///
/// Credential extraction order: `token` query parameter, then
/// `Authorization: Bearer`, then the named session cookie. A missing
/// credential admits the connection anonymously; a present-but-invalid one
/// rejects the handshake before any registry state exists.
async fn ws_entry(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let identity = match extract_credential(&req, &state.presence.session_cookie) {
        Some(token) => match state.verifier.verify(&token).await {
            Ok(user_id) => Some(user_id),
            Err(AppwriteError::Unauthorized) => {
                tracing::info!("Rejected channel handshake: invalid credential");
                return Ok(HttpResponse::Unauthorized().json(ErrorResponse {
                    error: "unauthorized".to_string(),
                    message: "Invalid or expired credential".to_string(),
                    status_code: 401,
                }));
            }
            Err(e) => {
                tracing::error!("Credential verification unavailable: {}", e);
                return Ok(HttpResponse::ServiceUnavailable().json(ErrorResponse {
                    error: "auth_unavailable".to_string(),
                    message: e.to_string(),
                    status_code: 503,
                }));
            }
        },
        None => None,
    };

    // Cache the partner id for presence announcements. A missing profile is
    // a pre-profile flow, not a handshake failure.
    let partner_id = match identity.as_deref() {
        Some(user_id) => match state.directory.get_profile(user_id).await {
            Ok(profile) => profile.partner_id,
            Err(DirectoryError::NotFound(_)) => None,
            Err(e) => {
                tracing::warn!("Partner lookup failed for {}, presence degraded: {}", user_id, e);
                None
            }
        },
        None => None,
    };

    let session = WsSession::new(
        identity,
        partner_id,
        Duration::from_secs(state.presence.ping_interval_secs),
        Arc::clone(&state.registry),
        state.broadcaster.clone(),
        Arc::clone(&state.engine),
    );

    ws::start(session, &req, stream)
}

/// Extract a bearer credential from handshake metadata
///
/// Order: query parameter, Authorization header, session cookie.
fn extract_credential(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    for pair in req.query_string().split('&') {
        if let Some(value) = pair.strip_prefix("token=") {
            if !value.is_empty() {
                return Some(
                    urlencoding::decode(value)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| value.to_string()),
                );
            }
        }
    }

    if let Some(header) = req.headers().get(actix_web::http::header::AUTHORIZATION) {
        if let Ok(value) = header.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    req.cookie(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_extract_credential_prefers_query_parameter() {
        let req = TestRequest::default()
            .uri("/ws?token=from-query")
            .insert_header((actix_web::http::header::AUTHORIZATION, "Bearer from-header"))
            .to_http_request();

        assert_eq!(
            extract_credential(&req, "pairplate_session"),
            Some("from-query".to_string())
        );
    }

    #[test]
    fn test_extract_credential_falls_back_to_bearer_header() {
        let req = TestRequest::default()
            .uri("/ws")
            .insert_header((actix_web::http::header::AUTHORIZATION, "Bearer from-header"))
            .to_http_request();

        assert_eq!(
            extract_credential(&req, "pairplate_session"),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn test_extract_credential_falls_back_to_cookie() {
        let req = TestRequest::default()
            .uri("/ws")
            .insert_header((actix_web::http::header::COOKIE, "pairplate_session=from-cookie"))
            .to_http_request();

        assert_eq!(
            extract_credential(&req, "pairplate_session"),
            Some("from-cookie".to_string())
        );
    }

    #[test]
    fn test_extract_credential_absent() {
        let req = TestRequest::default().uri("/ws").to_http_request();
        assert_eq!(extract_credential(&req, "pairplate_session"), None);
    }

    #[test]
    fn test_extract_credential_ignores_empty_cookie_value() {
        // An empty cookie is absent, not an invalid credential.
        let req = TestRequest::default()
            .uri("/ws")
            .insert_header((actix_web::http::header::COOKIE, "pairplate_session="))
            .to_http_request();

        assert_eq!(extract_credential(&req, "pairplate_session"), None);
    }

    #[test]
    fn test_extract_credential_ignores_empty_query_value() {
        let req = TestRequest::default()
            .uri("/ws?token=")
            .insert_header((actix_web::http::header::COOKIE, "pairplate_session=from-cookie"))
            .to_http_request();

        assert_eq!(
            extract_credential(&req, "pairplate_session"),
            Some("from-cookie".to_string())
        );
    }
}
