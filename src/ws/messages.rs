use crate::models::{RecipeSummary, SwipeSubmission};
use actix::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events pushed to clients over the real-time channel
///
/// Discriminated on a `type` field. These are best-effort, idempotent
/// state-refresh hints; no ordering is guaranteed between events emitted
/// within the same tick. The match store remains the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Message)]
#[rtype(result = "()")]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    Connected {
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    PartnerOnline,
    PartnerOffline,
    #[serde(rename_all = "camelCase")]
    PartnerSwiping { recipe_id: String, action: String },
    #[serde(rename_all = "camelCase")]
    NewMatch { match_id: Uuid, recipe: RecipeSummary },
    Pong,
    Error { code: String, message: String },
}

impl ServerEvent {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Messages accepted from clients
///
/// The sender's identity is implicit from the authenticated connection and
/// never taken from the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Application-level liveness check; answered with `pong`
    Ping,
    /// Swipe submission dispatched to the match engine
    Swipe(SwipeSubmission),
    /// In-the-moment activity relayed to the partner as `partnerSwiping`
    #[serde(rename_all = "camelCase")]
    Activity { recipe_id: String, action: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_event_wire_tags() {
        let json = serde_json::to_value(&ServerEvent::PartnerOnline).unwrap();
        assert_eq!(json["type"], "partnerOnline");

        let json = serde_json::to_value(&ServerEvent::PartnerSwiping {
            recipe_id: "r1".to_string(),
            action: "liked".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "partnerSwiping");
        assert_eq!(json["recipeId"], "r1");
        assert_eq!(json["action"], "liked");
    }

    #[test]
    fn test_new_match_carries_recipe_metadata() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(&ServerEvent::NewMatch {
            match_id: id,
            recipe: RecipeSummary {
                recipe_id: "r1".to_string(),
                title: "Shakshuka".to_string(),
                image_file_id: None,
            },
        })
        .unwrap();
        assert_eq!(json["type"], "newMatch");
        assert_eq!(json["matchId"], id.to_string());
        assert_eq!(json["recipe"]["title"], "Shakshuka");
    }

    #[test]
    fn test_connected_omits_absent_user_id() {
        let json = serde_json::to_string(&ServerEvent::Connected { user_id: None }).unwrap();
        assert!(!json.contains("userId"));
    }

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"swipe","recipeId":"r1","liked":true}"#).unwrap();
        match msg {
            ClientMessage::Swipe(submission) => {
                assert_eq!(submission.recipe_id, "r1");
                assert!(submission.liked);
            }
            other => panic!("expected swipe, got {:?}", other),
        }

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"activity","recipeId":"r2","action":"viewing"}"#)
                .unwrap();
        assert!(matches!(msg, ClientMessage::Activity { .. }));
    }
}
