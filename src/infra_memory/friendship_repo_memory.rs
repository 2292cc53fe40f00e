use super::repo_tx_memory::{MemoryStore, downcast};
use super::state::{paginate, pull, push_unique};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryFriendshipRepo {
    store: MemoryStore,
}

impl MemoryFriendshipRepo {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl FriendshipRepo for MemoryFriendshipRepo {
    async fn find_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        peer: UserId,
    ) -> Result<Option<FriendEdge>, RelationError> {
        let state = downcast(tx)?.state();
        Ok(state.doc(owner)?.relations.friend(peer).cloned())
    }

    async fn insert_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        edge: &FriendEdge,
    ) -> Result<bool, RelationError> {
        if owner == edge.peer_id {
            return Err(RelationError::SelfAction);
        }
        let doc = downcast(tx)?.state_mut().doc_mut(owner)?;
        let peer = edge.peer_id;
        Ok(push_unique(&mut doc.relations.friends, edge.clone(), |e| {
            e.peer_id == peer
        }))
    }

    async fn update_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        peer: UserId,
        status: FriendStatus,
        blocked_by: Option<UserId>,
    ) -> Result<bool, RelationError> {
        let doc = downcast(tx)?.state_mut().doc_mut(owner)?;
        match doc.relations.friends.iter_mut().find(|e| e.peer_id == peer) {
            Some(edge) => {
                edge.status = status;
                edge.blocked_by = blocked_by;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        owner: UserId,
        peer: UserId,
    ) -> Result<bool, RelationError> {
        let doc = downcast(tx)?.state_mut().doc_mut(owner)?;
        Ok(pull(&mut doc.relations.friends, |e| e.peer_id == peer))
    }

    async fn has_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        recipient: UserId,
        sender: UserId,
    ) -> Result<bool, RelationError> {
        let state = downcast(tx)?.state();
        Ok(state.doc(recipient)?.relations.has_request_from(sender))
    }

    async fn insert_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        recipient: UserId,
        request: &FriendRequest,
    ) -> Result<bool, RelationError> {
        if recipient == request.from_id {
            return Err(RelationError::SelfAction);
        }
        let doc = downcast(tx)?.state_mut().doc_mut(recipient)?;
        let from = request.from_id;
        Ok(push_unique(
            &mut doc.relations.friend_requests,
            request.clone(),
            |r| r.from_id == from,
        ))
    }

    async fn delete_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        recipient: UserId,
        sender: UserId,
    ) -> Result<bool, RelationError> {
        let doc = downcast(tx)?.state_mut().doc_mut(recipient)?;
        Ok(pull(&mut doc.relations.friend_requests, |r| r.from_id == sender))
    }

    async fn list_friends(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<FriendSummary>, u64), RelationError> {
        let state = self.store.read().await;
        let friends = &state.doc(user_id)?.relations.friends;
        let items = paginate(friends, pagination)
            .into_iter()
            .filter_map(|edge| {
                state.peer_summary(edge.peer_id).map(|peer| FriendSummary {
                    user_id: peer.user_id,
                    username: peer.username,
                    display_name: peer.display_name,
                    status: edge.status,
                    blocked_by: edge.blocked_by,
                    conversation_id: edge.conversation_id,
                    since: edge.since,
                })
            })
            .collect();
        Ok((items, friends.len() as u64))
    }

    async fn list_requests(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<FriendRequestSummary>, u64), RelationError> {
        let state = self.store.read().await;
        let requests = &state.doc(user_id)?.relations.friend_requests;
        let items = paginate(requests, pagination)
            .into_iter()
            .filter_map(|request| {
                state
                    .peer_summary(request.from_id)
                    .map(|peer| FriendRequestSummary {
                        from_id: peer.user_id,
                        username: peer.username,
                        display_name: peer.display_name,
                        since: request.since,
                    })
            })
            .collect();
        Ok((items, requests.len() as u64))
    }

    async fn edges_of(&self, user_id: UserId) -> Result<Vec<FriendEdge>, RelationError> {
        Ok(self.store.read().await.doc(user_id)?.relations.friends.clone())
    }

    async fn requests_of(&self, user_id: UserId) -> Result<Vec<FriendRequest>, RelationError> {
        Ok(self
            .store
            .read()
            .await
            .doc(user_id)?
            .relations
            .friend_requests
            .clone())
    }
}
