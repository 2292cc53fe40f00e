use crate::application_port::RelationError;
use crate::domain_model::*;
use crate::domain_port::StorageTx;

#[async_trait::async_trait]
pub trait ConversationProvisioner: Send + Sync {
    /// Creates the direct conversation of a pair inside the caller's
    /// transaction, or returns the one the pair already has.
    async fn create_direct_conversation_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        participants: [UserId; 2],
    ) -> Result<ConversationId, RelationError>;
}
