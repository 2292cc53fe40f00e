use crate::domain_model::UserId;
use std::sync::Arc;

/// Handle to one user's live connection.
#[cfg_attr(test, mockall::automock)]
pub trait LiveConnection: Send + Sync {
    /// Queues a text frame without waiting; fails when the connection is
    /// gone or its mailbox is full.
    fn push(&self, payload: String) -> anyhow::Result<()>;
}

/// Presence registry as seen by the core. The transport layer owns the
/// connections and their lifecycle.
#[cfg_attr(test, mockall::automock)]
pub trait PresenceLookup: Send + Sync {
    fn get_connection(&self, user_id: UserId) -> Option<Arc<dyn LiveConnection>>;
}
