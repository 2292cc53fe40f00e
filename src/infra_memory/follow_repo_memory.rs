use super::repo_tx_memory::{MemoryStore, downcast};
use super::state::{pull, push_unique};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};

pub struct MemoryFollowRepo {
    store: MemoryStore,
}

impl MemoryFollowRepo {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl FollowRepo for MemoryFollowRepo {
    async fn is_following_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        follower: UserId,
        followee: UserId,
    ) -> Result<bool, RelationError> {
        let state = downcast(tx)?.state();
        Ok(state.doc(follower)?.relations.following.contains(&followee))
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        follower: UserId,
        followee: UserId,
        _since: DateTime<Utc>,
    ) -> Result<bool, RelationError> {
        if follower == followee {
            return Err(RelationError::SelfAction);
        }
        let state = downcast(tx)?.state_mut();
        // both documents must exist before either is touched
        state.doc(followee)?;
        let following = &mut state.doc_mut(follower)?.relations.following;
        if !push_unique(following, followee, |id| *id == followee) {
            return Ok(false);
        }
        let followers = &mut state.doc_mut(followee)?.relations.followers;
        push_unique(followers, follower, |id| *id == follower);
        Ok(true)
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        follower: UserId,
        followee: UserId,
    ) -> Result<bool, RelationError> {
        let state = downcast(tx)?.state_mut();
        state.doc(followee)?;
        let following = &mut state.doc_mut(follower)?.relations.following;
        if !pull(following, |id| *id == followee) {
            return Ok(false);
        }
        let followers = &mut state.doc_mut(followee)?.relations.followers;
        pull(followers, |id| *id == follower);
        Ok(true)
    }

    async fn list_followers(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<PeerSummary>, u64), RelationError> {
        let state = self.store.read().await;
        let ids = &state.doc(user_id)?.relations.followers;
        Ok(state.peer_summaries(ids, pagination))
    }

    async fn list_following(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<PeerSummary>, u64), RelationError> {
        let state = self.store.read().await;
        let ids = &state.doc(user_id)?.relations.following;
        Ok(state.peer_summaries(ids, pagination))
    }

    async fn follower_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        Ok(self.store.read().await.doc(user_id)?.relations.followers.clone())
    }

    async fn following_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        Ok(self.store.read().await.doc(user_id)?.relations.following.clone())
    }
}
