mod block_repo_mysql;
mod conversation_repo_mysql;
mod follow_repo_mysql;
mod friendship_repo_mysql;
mod user_repo_mysql;

pub use block_repo_mysql::*;
pub use conversation_repo_mysql::*;
pub use follow_repo_mysql::*;
pub use friendship_repo_mysql::*;
pub use user_repo_mysql::*;

mod repo_tx_mysql;

pub use repo_tx_mysql::*;

mod util;

/// Applies the embedded schema migrations.
pub async fn migrate(pool: &sqlx::MySqlPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
