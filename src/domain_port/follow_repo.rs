use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;
use chrono::{DateTime, Utc};

/// Directional follow edges. One edge is both `follower.following` and
/// `followee.followers`, so a single insert or delete moves both sides.
#[async_trait::async_trait]
pub trait FollowRepo: Send + Sync {
    async fn is_following_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        follower: UserId,
        followee: UserId,
    ) -> Result<bool, RelationError>;
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        follower: UserId,
        followee: UserId,
        since: DateTime<Utc>,
    ) -> Result<bool, RelationError>;
    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        follower: UserId,
        followee: UserId,
    ) -> Result<bool, RelationError>;

    async fn list_followers(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<PeerSummary>, u64), RelationError>;
    async fn list_following(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<PeerSummary>, u64), RelationError>;

    async fn follower_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError>;
    async fn following_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError>;
}
