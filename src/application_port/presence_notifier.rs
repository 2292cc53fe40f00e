use crate::domain_model::*;

#[async_trait::async_trait]
pub trait PresenceNotifier: Send + Sync {
    /// Best-effort push to the receiver's live connection. Returns whether
    /// the event was handed to a connection; never fails.
    async fn notify(&self, receiver: UserId, event: &S2CEvent) -> bool;
}
