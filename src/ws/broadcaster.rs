use crate::ws::messages::ServerEvent;
use crate::ws::registry::ConnectionRegistry;
use std::sync::Arc;
use tracing::trace;

/// Directed delivery of events to online users
///
/// An offline recipient is a silent no-op; durable fallback is the caller's
/// responsibility via the notification sink.
#[derive(Clone)]
pub struct EventBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver an event to a single user
    ///
    /// Returns true when the user had a live channel and the event was
    /// handed to it.
    pub fn send_to(&self, user_id: &str, event: &ServerEvent) -> bool {
        match self.registry.get(user_id) {
            Some(entry) => {
                let delivered = entry.recipient.try_send(event.clone()).is_ok();
                trace!("Delivery to {}: {}", user_id, delivered);
                delivered
            }
            None => {
                trace!("Delivery to {} skipped, offline", user_id);
                false
            }
        }
    }

    /// Deliver an event to both members of a pair
    ///
    /// Returns true when at least one side received it.
    pub fn send_to_pair(&self, user_id: &str, partner_id: &str, event: &ServerEvent) -> bool {
        let first = self.send_to(user_id, event);
        let second = self.send_to(partner_id, event);
        first || second
    }
}
