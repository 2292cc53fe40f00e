use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

/// Fire-and-forget fan-out over whatever the presence registry knows.
pub struct LivePresenceNotifier {
    presence: Arc<dyn PresenceLookup>,
}

impl LivePresenceNotifier {
    pub fn new(presence: Arc<dyn PresenceLookup>) -> Self {
        Self { presence }
    }
}

#[async_trait::async_trait]
impl PresenceNotifier for LivePresenceNotifier {
    async fn notify(&self, receiver: UserId, event: &S2CEvent) -> bool {
        let Some(conn) = self.presence.get_connection(receiver) else {
            tracing::debug!(%receiver, event = event.name(), "receiver offline, event dropped");
            return false;
        };

        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(%receiver, event = event.name(), "serialize event: {e}");
                return false;
            }
        };

        match conn.push(payload) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%receiver, event = event.name(), "push event: {e}");
                false
            }
        }
    }
}
