//! PairPlate - presence and match-coordination service for the PairPlate recipe app
//!
//! This library provides the real-time core of the PairPlate app: a
//! WebSocket channel manager with partner presence tracking, and the
//! swipe-and-match engine that detects a mutual like exactly once even
//! under concurrent submissions from both partners.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;
pub mod ws;

// Re-export commonly used types
pub use crate::core::{pair_key, MatchStore, NotificationSink, RecipeCatalog, SwipeEngine, SwipeError, UserDirectory};
pub use crate::models::{MatchRecord, RecipeSummary, SwipeOutcome, SwipeSubmission, UserProfile};
pub use crate::ws::{ConnectionRegistry, EventBroadcaster, ServerEvent, WsSession};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        assert_eq!(pair_key("b", "a"), "a:b");
    }
}
