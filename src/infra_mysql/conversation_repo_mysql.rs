use super::util::{downcast, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::MySqlPool;

pub struct MySqlConversationRepo {
    pool: MySqlPool,
}

impl MySqlConversationRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlConversationRepo { pool }
    }
}

#[async_trait::async_trait]
impl ConversationRepo for MySqlConversationRepo {
    async fn find_direct_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: UserPair,
    ) -> Result<Option<ConversationId>, RelationError> {
        let tx = downcast(tx)?;

        sqlx::query_scalar::<_, ConversationId>(
            "SELECT conversation_id FROM direct_pair WHERE user_min = ? AND user_max = ? FOR UPDATE",
        )
        .bind(pair.min())
        .bind(pair.max())
        .fetch_optional(tx.conn())
        .await
        .map_err(store_err("query direct pair"))
    }

    async fn create_direct_conversation_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
        conversation_id: ConversationId,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx)?;

        sqlx::query("INSERT INTO conversation (conversation_id, kind) VALUES (?, 'direct')")
            .bind(conversation_id)
            .execute(tx.conn())
            .await
            .map_err(store_err("insert conversation"))?;

        sqlx::query(
            r#"
INSERT INTO direct_pair (user_min, user_max, conversation_id)
VALUES (?, ?, ?)
"#,
        )
        .bind(pair.min())
        .bind(pair.max())
        .bind(conversation_id)
        .execute(tx.conn())
        .await
        .map_err(store_err("insert direct pair"))?;

        sqlx::query(
            r#"
INSERT INTO conversation_member (conversation_id, user_id)
VALUES (?, ?), (?, ?)
"#,
        )
        .bind(conversation_id)
        .bind(pair.min())
        .bind(conversation_id)
        .bind(pair.max())
        .execute(tx.conn())
        .await
        .map_err(store_err("insert conversation members"))?;

        Ok(())
    }

    async fn get_members(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<UserId>, RelationError> {
        sqlx::query_scalar::<_, UserId>(
            "SELECT user_id FROM conversation_member WHERE conversation_id = ? ORDER BY user_id",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("query conversation members"))
    }
}
