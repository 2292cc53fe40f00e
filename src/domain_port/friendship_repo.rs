use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

/// Friend edges (one row per owner/peer, mirrored by the service) and the
/// inbound request lists. Inserts and deletes report whether a row changed,
/// which is how callers detect a lost race.
#[async_trait::async_trait]
pub trait FriendshipRepo: Send + Sync {
    async fn find_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        peer: UserId,
    ) -> Result<Option<FriendEdge>, RelationError>;
    async fn insert_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        edge: &FriendEdge,
    ) -> Result<bool, RelationError>;
    async fn update_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        peer: UserId,
        status: FriendStatus,
        blocked_by: Option<UserId>,
    ) -> Result<bool, RelationError>;
    async fn delete_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        peer: UserId,
    ) -> Result<bool, RelationError>;

    async fn has_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        recipient: UserId,
        sender: UserId,
    ) -> Result<bool, RelationError>;
    async fn insert_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        recipient: UserId,
        request: &FriendRequest,
    ) -> Result<bool, RelationError>;
    async fn delete_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        recipient: UserId,
        sender: UserId,
    ) -> Result<bool, RelationError>;

    /// Edges of `user` in insertion order, peers populated.
    async fn list_friends(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<FriendSummary>, u64), RelationError>;
    /// Inbound requests of `user` in arrival order, senders populated.
    async fn list_requests(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<FriendRequestSummary>, u64), RelationError>;

    async fn edges_of(&self, user_id: UserId) -> Result<Vec<FriendEdge>, RelationError>;
    async fn requests_of(&self, user_id: UserId) -> Result<Vec<FriendRequest>, RelationError>;
}
