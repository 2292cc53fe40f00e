use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealConversationProvisioner {
    conversation_repo: Arc<dyn ConversationRepo>,
}

impl RealConversationProvisioner {
    pub fn new(conversation_repo: Arc<dyn ConversationRepo>) -> Self {
        Self { conversation_repo }
    }
}

#[async_trait::async_trait]
impl ConversationProvisioner for RealConversationProvisioner {
    async fn create_direct_conversation_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        participants: [UserId; 2],
    ) -> Result<ConversationId, RelationError> {
        let [a, b] = participants;
        if a == b {
            return Err(RelationError::SelfAction);
        }
        let pair = UserPair::new(a, b);

        // friends who split up and reconnect keep their history
        if let Some(existing) = self.conversation_repo.find_direct_in_tx(tx, pair).await? {
            tracing::debug!(conversation_id = %existing, "reusing direct conversation");
            return Ok(existing);
        }

        let conversation_id = ConversationId::new_v4();
        self.conversation_repo
            .create_direct_conversation_in_tx(tx, pair, conversation_id)
            .await?;
        tracing::debug!(%conversation_id, "direct conversation created");
        Ok(conversation_id)
    }
}
