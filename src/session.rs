//! Session management: a bounded rolling window of conversation exchanges
//! per session id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

/// One question/answer exchange.
#[derive(Debug, Clone)]
struct Exchange {
    user: String,
    assistant: String,
}

/// Tracks conversation history per session, keeping only the most recent
/// `max_history` exchanges.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Vec<Exchange>>>>,
    max_history: usize,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_history,
        }
    }

    /// Mint a fresh session id.
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(id.clone(), Vec::new());
        id
    }

    /// Render the session's exchanges for the system prompt.
    ///
    /// Returns `None` for an unknown session or one with no exchanges yet,
    /// so the caller leaves the system prompt untouched.
    pub async fn conversation_history(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().await;
        let exchanges = sessions.get(session_id)?;
        if exchanges.is_empty() {
            return None;
        }
        Some(
            exchanges
                .iter()
                .map(|exchange| {
                    format!("User: {}\nAssistant: {}", exchange.user, exchange.assistant)
                })
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Append an exchange, creating the session entry if needed and evicting
    /// the oldest exchanges beyond the window.
    pub async fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) {
        let mut sessions = self.sessions.write().await;
        let exchanges = sessions.entry(session_id.to_string()).or_default();
        exchanges.push(Exchange {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
        if exchanges.len() > self.max_history {
            let excess = exchanges.len() - self.max_history;
            exchanges.drain(..excess);
        }
    }

    /// Drop a session's history. Deleting an unknown id is a no-op.
    pub async fn clear_session(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }
}
