use crate::ws::messages::ServerEvent;
use actix::Recipient;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// A live channel registered for a user
#[derive(Clone)]
pub struct ConnectionEntry {
    /// Identifies the owning session so a replaced connection's teardown
    /// cannot evict its successor
    pub conn_id: Uuid,
    pub recipient: Recipient<ServerEvent>,
    /// Partner id cached at registration time, not live-refreshed
    pub partner_id: Option<String>,
}

/// Process-wide directory of live channels
///
/// All mutation goes through the inner mutex; the registry is constructed
/// explicitly and shared via `Arc` in application state, never a module
/// global. Registration is last-writer-wins for a user id: the registry does
/// not close the prior handle, the session lifecycle owns that.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<String, ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, user_id: &str, entry: ConnectionEntry) {
        let mut connections = self.connections.lock().expect("registry lock poisoned");
        connections.insert(user_id.to_string(), entry);
    }

    /// Remove the user's entry if it still belongs to the given connection
    ///
    /// Returns true when an entry was removed.
    pub fn deregister(&self, user_id: &str, conn_id: Uuid) -> bool {
        let mut connections = self.connections.lock().expect("registry lock poisoned");
        match connections.get(user_id) {
            Some(entry) if entry.conn_id == conn_id => {
                connections.remove(user_id);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, user_id: &str) -> Option<ConnectionEntry> {
        let connections = self.connections.lock().expect("registry lock poisoned");
        connections.get(user_id).cloned()
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        let connections = self.connections.lock().expect("registry lock poisoned");
        connections.contains_key(user_id)
    }

    pub fn list_online(&self) -> Vec<String> {
        let connections = self.connections.lock().expect("registry lock poisoned");
        connections.keys().cloned().collect()
    }

    /// Partner id cached for an online user
    pub fn partner_of(&self, user_id: &str) -> Option<String> {
        let connections = self.connections.lock().expect("registry lock poisoned");
        connections.get(user_id).and_then(|e| e.partner_id.clone())
    }
}
