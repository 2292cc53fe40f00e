use super::util::{downcast, is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlFollowRepo {
    pool: MySqlPool,
}

impl MySqlFollowRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlFollowRepo { pool }
    }

    async fn list_peers(
        &self,
        list_sql: &str,
        count_sql: &str,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<PeerSummary>, u64), RelationError> {
        let rows = sqlx::query(list_sql)
            .bind(user_id)
            .bind(u64::from(pagination.limit.0))
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("list follow edges"))?;

        let items = rows
            .iter()
            .map(decode_peer)
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err("decode peer"))?;

        let total: i64 = sqlx::query_scalar(count_sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_err("count follow edges"))?;

        Ok((items, total as u64))
    }

    async fn ids(&self, sql: &str, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        sqlx::query_scalar::<_, UserId>(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("query follow ids"))
    }
}

fn decode_peer(row: &MySqlRow) -> Result<PeerSummary, sqlx::Error> {
    Ok(PeerSummary {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        display_name: row.try_get("display_name")?,
    })
}

#[async_trait::async_trait]
impl FollowRepo for MySqlFollowRepo {
    async fn is_following_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        follower: UserId,
        followee: UserId,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let row = sqlx::query(
            "SELECT 1 FROM follow_edge WHERE follower_id = ? AND followee_id = ? FOR UPDATE",
        )
        .bind(follower)
        .bind(followee)
        .fetch_optional(tx.conn())
        .await
        .map_err(store_err("query follow edge"))?;

        Ok(row.is_some())
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        follower: UserId,
        followee: UserId,
        since: DateTime<Utc>,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query(
            "INSERT INTO follow_edge (follower_id, followee_id, since) VALUES (?, ?, ?)",
        )
        .bind(follower)
        .bind(followee)
        .bind(since)
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) if is_dup_key(&e) => Ok(false),
            Err(e) => Err(store_err("insert follow edge")(e)),
        }
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        follower: UserId,
        followee: UserId,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query("DELETE FROM follow_edge WHERE follower_id = ? AND followee_id = ?")
            .bind(follower)
            .bind(followee)
            .execute(tx.conn())
            .await
            .map_err(store_err("delete follow edge"))?;

        Ok(res.rows_affected() > 0)
    }

    async fn list_followers(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<PeerSummary>, u64), RelationError> {
        self.list_peers(
            r#"
SELECT u.user_id, u.username, u.display_name
FROM follow_edge f
JOIN user u ON u.user_id = f.follower_id
WHERE f.followee_id = ?
ORDER BY f.seq ASC
LIMIT ? OFFSET ?
"#,
            "SELECT COUNT(*) FROM follow_edge WHERE followee_id = ?",
            user_id,
            pagination,
        )
        .await
    }

    async fn list_following(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<PeerSummary>, u64), RelationError> {
        self.list_peers(
            r#"
SELECT u.user_id, u.username, u.display_name
FROM follow_edge f
JOIN user u ON u.user_id = f.followee_id
WHERE f.follower_id = ?
ORDER BY f.seq ASC
LIMIT ? OFFSET ?
"#,
            "SELECT COUNT(*) FROM follow_edge WHERE follower_id = ?",
            user_id,
            pagination,
        )
        .await
    }

    async fn follower_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        self.ids(
            "SELECT follower_id FROM follow_edge WHERE followee_id = ? ORDER BY seq ASC",
            user_id,
        )
        .await
    }

    async fn following_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        self.ids(
            "SELECT followee_id FROM follow_edge WHERE follower_id = ? ORDER BY seq ASC",
            user_id,
        )
        .await
    }
}
