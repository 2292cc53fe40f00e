use super::util::{downcast, is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        profile: &UserProfile,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query(
            r#"
INSERT INTO user (user_id, username, display_name)
VALUES (?, ?, ?)
"#,
        )
        .bind(profile.user_id)
        .bind(&profile.username)
        .bind(&profile.display_name)
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_dup_key(&e) => Err(RelationError::Store(format!(
                "duplicate user: {}",
                profile.username
            ))),
            Err(e) => Err(store_err("insert user")(e)),
        }
    }

    async fn exists_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx)?;

        let row = sqlx::query("SELECT 1 FROM user WHERE user_id = ? LOCK IN SHARE MODE")
            .bind(user_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(store_err("query user"))?;

        Ok(row.is_some())
    }

    async fn get_profile_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Option<UserProfile>, RelationError> {
        let tx = downcast(tx)?;

        let row =
            sqlx::query("SELECT user_id, username, display_name FROM user WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(tx.conn())
                .await
                .map_err(store_err("query profile"))?;

        row.as_ref()
            .map(decode_profile)
            .transpose()
            .map_err(store_err("decode profile"))
    }

    async fn exists(&self, user_id: UserId) -> Result<bool, RelationError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM user WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_err("count user"))?;

        Ok(count > 0)
    }
}

fn decode_profile(row: &sqlx::mysql::MySqlRow) -> Result<UserProfile, sqlx::Error> {
    Ok(UserProfile {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        display_name: row.try_get("display_name")?,
    })
}
