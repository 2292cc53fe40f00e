use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait ConversationRepo: Send + Sync {
    async fn find_direct_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: UserPair,
    ) -> Result<Option<ConversationId>, RelationError>;
    async fn create_direct_conversation_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
        conversation_id: ConversationId,
    ) -> Result<(), RelationError>;
    async fn get_members(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<UserId>, RelationError>;
}
