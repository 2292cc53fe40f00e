use super::util::{downcast, is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlFriendshipRepo {
    pool: MySqlPool,
}

impl MySqlFriendshipRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlFriendshipRepo { pool }
    }
}

fn decode_status(row: &MySqlRow) -> Result<FriendStatus, sqlx::Error> {
    let raw: String = row.try_get("status")?;
    raw.parse::<FriendStatus>()
        .map_err(|e| sqlx::Error::Decode(e.into()))
}

fn decode_edge(row: &MySqlRow) -> Result<FriendEdge, sqlx::Error> {
    Ok(FriendEdge {
        peer_id: row.try_get("peer_id")?,
        status: decode_status(row)?,
        blocked_by: row.try_get("blocked_by")?,
        conversation_id: row.try_get("conversation_id")?,
        since: row.try_get("since")?,
    })
}

fn decode_friend_summary(row: &MySqlRow) -> Result<FriendSummary, sqlx::Error> {
    Ok(FriendSummary {
        user_id: row.try_get("peer_id")?,
        username: row.try_get("username")?,
        display_name: row.try_get("display_name")?,
        status: decode_status(row)?,
        blocked_by: row.try_get("blocked_by")?,
        conversation_id: row.try_get("conversation_id")?,
        since: row.try_get("since")?,
    })
}

fn decode_request_summary(row: &MySqlRow) -> Result<FriendRequestSummary, sqlx::Error> {
    Ok(FriendRequestSummary {
        from_id: row.try_get("sender_id")?,
        username: row.try_get("username")?,
        display_name: row.try_get("display_name")?,
        since: row.try_get("since")?,
    })
}

#[async_trait::async_trait]
impl FriendshipRepo for MySqlFriendshipRepo {
    async fn find_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        peer: UserId,
    ) -> Result<Option<FriendEdge>, RelationError> {
        let tx = downcast(tx)?;

        let row = sqlx::query(
            r#"
SELECT peer_id, status, blocked_by, conversation_id, since
FROM friend_edge
WHERE owner_id = ? AND peer_id = ?
FOR UPDATE
"#,
        )
        .bind(owner)
        .bind(peer)
        .fetch_optional(tx.conn())
        .await
        .map_err(store_err("query friend edge"))?;

        row.as_ref()
            .map(decode_edge)
            .transpose()
            .map_err(store_err("decode friend edge"))
    }

    async fn insert_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        edge: &FriendEdge,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query(
            r#"
INSERT INTO friend_edge (owner_id, peer_id, status, blocked_by, conversation_id, since)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(owner)
        .bind(edge.peer_id)
        .bind(edge.status.to_string())
        .bind(edge.blocked_by)
        .bind(edge.conversation_id)
        .bind(edge.since)
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) if is_dup_key(&e) => Ok(false),
            Err(e) => Err(store_err("insert friend edge")(e)),
        }
    }

    async fn update_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        peer: UserId,
        status: FriendStatus,
        blocked_by: Option<UserId>,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query(
            "UPDATE friend_edge SET status = ?, blocked_by = ? WHERE owner_id = ? AND peer_id = ?",
        )
        .bind(status.to_string())
        .bind(blocked_by)
        .bind(owner)
        .bind(peer)
        .execute(tx.conn())
        .await
        .map_err(store_err("update friend edge"))?;

        Ok(res.rows_affected() > 0)
    }

    async fn delete_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        peer: UserId,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query("DELETE FROM friend_edge WHERE owner_id = ? AND peer_id = ?")
            .bind(owner)
            .bind(peer)
            .execute(tx.conn())
            .await
            .map_err(store_err("delete friend edge"))?;

        Ok(res.rows_affected() > 0)
    }

    async fn has_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        recipient: UserId,
        sender: UserId,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let row = sqlx::query(
            "SELECT 1 FROM friend_request WHERE recipient_id = ? AND sender_id = ? FOR UPDATE",
        )
        .bind(recipient)
        .bind(sender)
        .fetch_optional(tx.conn())
        .await
        .map_err(store_err("query friend request"))?;

        Ok(row.is_some())
    }

    async fn insert_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        recipient: UserId,
        request: &FriendRequest,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query(
            "INSERT INTO friend_request (recipient_id, sender_id, since) VALUES (?, ?, ?)",
        )
        .bind(recipient)
        .bind(request.from_id)
        .bind(request.since)
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) if is_dup_key(&e) => Ok(false),
            Err(e) => Err(store_err("insert friend request")(e)),
        }
    }

    async fn delete_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        recipient: UserId,
        sender: UserId,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query("DELETE FROM friend_request WHERE recipient_id = ? AND sender_id = ?")
            .bind(recipient)
            .bind(sender)
            .execute(tx.conn())
            .await
            .map_err(store_err("delete friend request"))?;

        Ok(res.rows_affected() > 0)
    }

    async fn list_friends(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<FriendSummary>, u64), RelationError> {
        let rows = sqlx::query(
            r#"
SELECT f.peer_id, u.username, u.display_name, f.status, f.blocked_by, f.conversation_id, f.since
FROM friend_edge f
JOIN user u ON u.user_id = f.peer_id
WHERE f.owner_id = ?
ORDER BY f.seq ASC
LIMIT ? OFFSET ?
"#,
        )
        .bind(user_id)
        .bind(u64::from(pagination.limit.0))
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("list friends"))?;

        let items = rows
            .iter()
            .map(decode_friend_summary)
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err("decode friend"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM friend_edge WHERE owner_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_err("count friends"))?;

        Ok((items, total as u64))
    }

    async fn list_requests(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<FriendRequestSummary>, u64), RelationError> {
        let rows = sqlx::query(
            r#"
SELECT r.sender_id, u.username, u.display_name, r.since
FROM friend_request r
JOIN user u ON u.user_id = r.sender_id
WHERE r.recipient_id = ?
ORDER BY r.seq ASC
LIMIT ? OFFSET ?
"#,
        )
        .bind(user_id)
        .bind(u64::from(pagination.limit.0))
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("list friend requests"))?;

        let items = rows
            .iter()
            .map(decode_request_summary)
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err("decode friend request"))?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM friend_request WHERE recipient_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(store_err("count friend requests"))?;

        Ok((items, total as u64))
    }

    async fn edges_of(&self, user_id: UserId) -> Result<Vec<FriendEdge>, RelationError> {
        let rows = sqlx::query(
            r#"
SELECT peer_id, status, blocked_by, conversation_id, since
FROM friend_edge
WHERE owner_id = ?
ORDER BY seq ASC
"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("query friend edges"))?;

        rows.iter()
            .map(decode_edge)
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err("decode friend edge"))
    }

    async fn requests_of(&self, user_id: UserId) -> Result<Vec<FriendRequest>, RelationError> {
        let rows = sqlx::query(
            "SELECT sender_id, since FROM friend_request WHERE recipient_id = ? ORDER BY seq ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("query friend requests"))?;

        rows.iter()
            .map(|row| {
                Ok(FriendRequest {
                    from_id: row.try_get("sender_id")?,
                    since: row.try_get("since")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(store_err("decode friend request"))
    }
}
