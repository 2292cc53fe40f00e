use super::util::{downcast, is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

pub struct MySqlBlockRepo {
    pool: MySqlPool,
}

impl MySqlBlockRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlBlockRepo { pool }
    }
}

#[async_trait::async_trait]
impl BlockRepo for MySqlBlockRepo {
    async fn is_blocking_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        blocker: UserId,
        blocked: UserId,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let row = sqlx::query(
            "SELECT 1 FROM block_edge WHERE blocker_id = ? AND blocked_id = ? FOR UPDATE",
        )
        .bind(blocker)
        .bind(blocked)
        .fetch_optional(tx.conn())
        .await
        .map_err(store_err("query block edge"))?;

        Ok(row.is_some())
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        blocker: UserId,
        blocked: UserId,
        since: DateTime<Utc>,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query("INSERT INTO block_edge (blocker_id, blocked_id, since) VALUES (?, ?, ?)")
            .bind(blocker)
            .bind(blocked)
            .bind(since)
            .execute(tx.conn())
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) if is_dup_key(&e) => Ok(false),
            Err(e) => Err(store_err("insert block edge")(e)),
        }
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        blocker: UserId,
        blocked: UserId,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query("DELETE FROM block_edge WHERE blocker_id = ? AND blocked_id = ?")
            .bind(blocker)
            .bind(blocked)
            .execute(tx.conn())
            .await
            .map_err(store_err("delete block edge"))?;

        Ok(res.rows_affected() > 0)
    }

    async fn blocked_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        sqlx::query_scalar::<_, UserId>(
            "SELECT blocked_id FROM block_edge WHERE blocker_id = ? ORDER BY seq ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("query blocked ids"))
    }
}
