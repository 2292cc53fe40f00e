use super::state::MemoryState;
use crate::application_port::RelationError;
use crate::domain_port::{StorageTx, TxManager};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

/// Shared handle to the in-memory state. Cloning shares the state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed state, for reads outside a transaction.
    pub async fn read(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().await
    }

    pub async fn conversation_count(&self) -> usize {
        self.state.lock().await.conversations.len()
    }
}

pub struct MemoryTxManager {
    store: MemoryStore,
}

impl MemoryTxManager {
    pub fn new(store: MemoryStore) -> Self {
        MemoryTxManager { store }
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryTxManager {
    async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
        let guard = self.store.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTx::new(guard)))
    }
}

/// Serializable transaction: holds the store lock for its whole life and
/// works on a copy that replaces the committed state on commit. Dropping it
/// without commit discards every write.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl MemoryTx {
    fn new(guard: OwnedMutexGuard<MemoryState>) -> Self {
        let working = guard.clone();
        MemoryTx { guard, working }
    }

    pub fn state(&self) -> &MemoryState {
        &self.working
    }

    pub fn state_mut(&mut self) -> &mut MemoryState {
        &mut self.working
    }
}

#[async_trait::async_trait]
impl<'t> StorageTx<'t> for MemoryTx {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_any_mut(&mut self) -> Option<&mut (dyn Any + Send)> {
        Some(self)
    }
}

pub fn downcast<'a>(tx: &'a mut dyn StorageTx<'_>) -> Result<&'a mut MemoryTx, RelationError> {
    tx.as_any_mut()
        .and_then(|any| any.downcast_mut::<MemoryTx>())
        .ok_or_else(|| RelationError::Store("transaction does not belong to the memory store".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::{ConversationId, UserId};

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let store = MemoryStore::new();
        let manager = MemoryTxManager::new(store.clone());

        {
            let mut tx = manager.begin().await.unwrap();
            let memory = downcast(&mut *tx).unwrap();
            memory
                .state_mut()
                .conversations
                .insert(ConversationId::new_v4(), vec![UserId::new_v4()]);
        }
        assert_eq!(store.conversation_count().await, 0);

        let mut tx = manager.begin().await.unwrap();
        downcast(&mut *tx)
            .unwrap()
            .state_mut()
            .conversations
            .insert(ConversationId::new_v4(), vec![UserId::new_v4()]);
        tx.commit().await.unwrap();
        assert_eq!(store.conversation_count().await, 1);
    }
}
