use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;
use chrono::{DateTime, Utc};

/// Per-user blocked list, independent of the friend-edge status.
#[async_trait::async_trait]
pub trait BlockRepo: Send + Sync {
    async fn is_blocking_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        blocker: UserId,
        blocked: UserId,
    ) -> Result<bool, RelationError>;
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        blocker: UserId,
        blocked: UserId,
        since: DateTime<Utc>,
    ) -> Result<bool, RelationError>;
    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        blocker: UserId,
        blocked: UserId,
    ) -> Result<bool, RelationError>;

    async fn blocked_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError>;
}
