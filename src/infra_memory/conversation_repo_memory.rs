use super::repo_tx_memory::{MemoryStore, downcast};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryConversationRepo {
    store: MemoryStore,
}

impl MemoryConversationRepo {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl ConversationRepo for MemoryConversationRepo {
    async fn find_direct_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: UserPair,
    ) -> Result<Option<ConversationId>, RelationError> {
        Ok(downcast(tx)?.state().direct_pairs.get(&pair).copied())
    }

    async fn create_direct_conversation_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
        conversation_id: ConversationId,
    ) -> Result<(), RelationError> {
        if pair.min() == pair.max() {
            return Err(RelationError::Store(
                "cannot create direct conversation with self".to_string(),
            ));
        }
        let state = downcast(tx)?.state_mut();
        if state.direct_pairs.contains_key(&pair) {
            return Err(RelationError::Store(
                "direct conversation already exists".to_string(),
            ));
        }
        state
            .conversations
            .insert(conversation_id, vec![pair.min(), pair.max()]);
        state.direct_pairs.insert(pair, conversation_id);
        Ok(())
    }

    async fn get_members(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<UserId>, RelationError> {
        Ok(self
            .store
            .read()
            .await
            .conversations
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}
