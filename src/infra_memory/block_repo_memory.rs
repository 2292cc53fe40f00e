use super::repo_tx_memory::{MemoryStore, downcast};
use super::state::{pull, push_unique};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};

pub struct MemoryBlockRepo {
    store: MemoryStore,
}

impl MemoryBlockRepo {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl BlockRepo for MemoryBlockRepo {
    async fn is_blocking_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        blocker: UserId,
        blocked: UserId,
    ) -> Result<bool, RelationError> {
        let state = downcast(tx)?.state();
        Ok(state.doc(blocker)?.relations.blocked_users.contains(&blocked))
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        blocker: UserId,
        blocked: UserId,
        _since: DateTime<Utc>,
    ) -> Result<bool, RelationError> {
        if blocker == blocked {
            return Err(RelationError::SelfAction);
        }
        let doc = downcast(tx)?.state_mut().doc_mut(blocker)?;
        Ok(push_unique(&mut doc.relations.blocked_users, blocked, |id| {
            *id == blocked
        }))
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        blocker: UserId,
        blocked: UserId,
    ) -> Result<bool, RelationError> {
        let doc = downcast(tx)?.state_mut().doc_mut(blocker)?;
        Ok(pull(&mut doc.relations.blocked_users, |id| *id == blocked))
    }

    async fn blocked_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        Ok(self
            .store
            .read()
            .await
            .doc(user_id)?
            .relations
            .blocked_users
            .clone())
    }
}
