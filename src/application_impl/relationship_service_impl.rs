use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RelationshipConfig {
    /// Upper bound for one transactional unit, begin to commit.
    pub tx_timeout: Duration,
    pub max_page_size: u16,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            tx_timeout: Duration::from_secs(5),
            max_page_size: 100,
        }
    }
}

#[derive(Clone)]
pub struct RelationshipRepos {
    pub user: Arc<dyn UserRepo>,
    pub friendship: Arc<dyn FriendshipRepo>,
    pub follow: Arc<dyn FollowRepo>,
    pub block: Arc<dyn BlockRepo>,
}

pub struct RealRelationshipService {
    repos: RelationshipRepos,
    provisioner: Arc<dyn ConversationProvisioner>,
    notifier: Arc<dyn PresenceNotifier>,
    tx_manager: Arc<dyn TxManager>,
    config: RelationshipConfig,
}

fn ensure_distinct(actor: UserId, target: UserId) -> Result<(), RelationError> {
    if actor == target {
        return Err(RelationError::SelfAction);
    }
    Ok(())
}

fn lost_race(what: &str) -> RelationError {
    RelationError::TransactionAborted(format!("concurrent update of {what}"))
}

impl RealRelationshipService {
    pub fn new(
        repos: RelationshipRepos,
        provisioner: Arc<dyn ConversationProvisioner>,
        notifier: Arc<dyn PresenceNotifier>,
        tx_manager: Arc<dyn TxManager>,
        config: RelationshipConfig,
    ) -> Self {
        Self {
            repos,
            provisioner,
            notifier,
            tx_manager,
            config,
        }
    }

    /// Runs one transactional unit under the configured deadline. Elapsing
    /// drops the unit's future, and with it the uncommitted transaction.
    async fn within_deadline<T>(
        &self,
        op: &'static str,
        unit: impl Future<Output = Result<T, RelationError>>,
    ) -> Result<T, RelationError> {
        match tokio::time::timeout(self.config.tx_timeout, unit).await {
            Ok(res) => res,
            Err(_) => {
                tracing::warn!(
                    op,
                    timeout_ms = self.config.tx_timeout.as_millis() as u64,
                    "transaction timed out"
                );
                Err(RelationError::TransactionAborted(format!(
                    "{op} exceeded {} ms",
                    self.config.tx_timeout.as_millis()
                )))
            }
        }
    }

    async fn begin(&self) -> Result<Box<dyn StorageTx<'_> + '_>, RelationError> {
        self.tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))
    }

    async fn commit(tx: Box<dyn StorageTx<'_> + '_>) -> Result<(), RelationError> {
        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))
    }

    fn validate_pagination(&self, pagination: Pagination) -> Result<(), RelationError> {
        if pagination.page < 1 {
            return Err(RelationError::InvalidPagination(
                "page starts at 1".to_string(),
            ));
        }
        let limit = pagination.limit.0;
        if !(1..=self.config.max_page_size).contains(&limit) {
            return Err(RelationError::InvalidPagination(format!(
                "limit must be within 1..={}",
                self.config.max_page_size
            )));
        }
        Ok(())
    }

    async fn ensure_listed_user(&self, user_id: UserId) -> Result<(), RelationError> {
        if !self.repos.user.exists(user_id).await? {
            return Err(RelationError::UserNotFound);
        }
        Ok(())
    }

    async fn ensure_users_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        users: [UserId; 2],
    ) -> Result<(), RelationError> {
        for user_id in users {
            if !self.repos.user.exists_in_tx(tx, user_id).await? {
                return Err(RelationError::UserNotFound);
            }
        }
        Ok(())
    }

    async fn profile_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user_id: UserId,
    ) -> Result<UserProfile, RelationError> {
        self.repos
            .user
            .get_profile_in_tx(tx, user_id)
            .await?
            .ok_or(RelationError::UserNotFound)
    }

    async fn load_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        actor: UserId,
        peer: UserId,
    ) -> Result<PairView, RelationError> {
        let friendship = &self.repos.friendship;
        let block = &self.repos.block;
        Ok(PairView {
            edge: friendship.find_edge_in_tx(tx, actor, peer).await?,
            inbound_request: friendship.has_request_in_tx(tx, actor, peer).await?,
            outbound_request: friendship.has_request_in_tx(tx, peer, actor).await?,
            actor_blocks: block.is_blocking_in_tx(tx, actor, peer).await?,
            peer_blocks: block.is_blocking_in_tx(tx, peer, actor).await?,
        })
    }

    async fn state_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        actor: UserId,
        peer: UserId,
    ) -> Result<FriendshipState, RelationError> {
        Ok(self.load_pair_in_tx(tx, actor, peer).await?.state(actor, peer))
    }

    async fn clear_requests_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: UserId,
        b: UserId,
    ) -> Result<(), RelationError> {
        self.repos.friendship.delete_request_in_tx(tx, a, b).await?;
        self.repos.friendship.delete_request_in_tx(tx, b, a).await?;
        Ok(())
    }

    /// Applies `write` to both sides of the pair's friend edge.
    async fn apply_edge_write_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        actor: UserId,
        peer: UserId,
        write: EdgeWrite,
    ) -> Result<(), RelationError> {
        let friendship = &self.repos.friendship;
        let changed = match write {
            EdgeWrite::Keep => return Ok(()),
            EdgeWrite::CreateAccepted => {
                let conversation_id = self
                    .provisioner
                    .create_direct_conversation_in_tx(tx, [actor, peer])
                    .await?;
                let edge = FriendEdge::accepted(peer, conversation_id, Utc::now());
                friendship.insert_edge_in_tx(tx, actor, &edge).await?
                    && friendship
                        .insert_edge_in_tx(tx, peer, &edge.mirrored(actor))
                        .await?
            }
            EdgeWrite::CreateBlocked { blocked_by } => {
                let edge = FriendEdge::blocked(peer, blocked_by, Utc::now());
                friendship.insert_edge_in_tx(tx, actor, &edge).await?
                    && friendship
                        .insert_edge_in_tx(tx, peer, &edge.mirrored(actor))
                        .await?
            }
            EdgeWrite::SetBlocked { blocked_by } => {
                self.update_both_in_tx(tx, actor, peer, FriendStatus::Blocked, Some(blocked_by))
                    .await?
            }
            EdgeWrite::RestoreAccepted => {
                self.update_both_in_tx(tx, actor, peer, FriendStatus::Accepted, None)
                    .await?
            }
            EdgeWrite::Delete => {
                friendship.delete_edge_in_tx(tx, actor, peer).await?
                    && friendship.delete_edge_in_tx(tx, peer, actor).await?
            }
        };
        if !changed {
            return Err(lost_race("friend edge"));
        }
        Ok(())
    }

    async fn update_both_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        actor: UserId,
        peer: UserId,
        status: FriendStatus,
        blocked_by: Option<UserId>,
    ) -> Result<bool, RelationError> {
        let friendship = &self.repos.friendship;
        Ok(friendship
            .update_edge_in_tx(tx, actor, peer, status, blocked_by)
            .await?
            && friendship
                .update_edge_in_tx(tx, peer, actor, status, blocked_by)
                .await?)
    }

    /// Shared body of remove, block and unblock: validate, run the extra
    /// bookkeeping, write the edge, report the resulting state.
    async fn transition(
        &self,
        op: &'static str,
        actor: UserId,
        peer: UserId,
        action: FriendshipAction,
    ) -> Result<FriendshipState, RelationError> {
        ensure_distinct(actor, peer)?;
        self.within_deadline(op, async {
            let mut tx = self.begin().await?;
            self.ensure_users_in_tx(&mut *tx, [actor, peer]).await?;
            let view = self.load_pair_in_tx(&mut *tx, actor, peer).await?;
            let write = view.plan(actor, peer, action)?;

            match action {
                FriendshipAction::Block => {
                    if !self
                        .repos
                        .block
                        .insert_in_tx(&mut *tx, actor, peer, Utc::now())
                        .await?
                    {
                        return Err(RelationError::AlreadyBlocked);
                    }
                    self.clear_requests_in_tx(&mut *tx, actor, peer).await?;
                }
                FriendshipAction::Unblock => {
                    if !self.repos.block.delete_in_tx(&mut *tx, actor, peer).await? {
                        return Err(RelationError::NotBlocked);
                    }
                }
                _ => {}
            }

            self.apply_edge_write_in_tx(&mut *tx, actor, peer, write)
                .await?;
            let state = self.state_in_tx(&mut *tx, actor, peer).await?;
            Self::commit(tx).await?;
            Ok(state)
        })
        .await
    }
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn send_friend_request(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<RelationOutcome, RelationError> {
        ensure_distinct(actor, target)?;
        let (state, sender) = self
            .within_deadline("send_friend_request", async {
                let mut tx = self.begin().await?;
                self.ensure_users_in_tx(&mut *tx, [actor, target]).await?;
                let view = self.load_pair_in_tx(&mut *tx, actor, target).await?;
                view.plan(actor, target, FriendshipAction::Request)?;

                let request = FriendRequest {
                    from_id: actor,
                    since: Utc::now(),
                };
                if !self
                    .repos
                    .friendship
                    .insert_request_in_tx(&mut *tx, target, &request)
                    .await?
                {
                    return Err(RelationError::FriendRequestExists);
                }
                let sender = self.profile_in_tx(&mut *tx, actor).await?;
                let state = self.state_in_tx(&mut *tx, actor, target).await?;
                Self::commit(tx).await?;
                Ok((state, sender))
            })
            .await?;

        tracing::info!(%actor, %target, "friend request sent");
        let event = S2CEvent::FriendRequestReceived(FriendRequestReceived {
            from: actor,
            username: sender.username,
            display_name: sender.display_name,
        });
        let notified = self.notifier.notify(target, &event).await;
        Ok(RelationOutcome::friendship(state, notified))
    }

    async fn accept_friend_request(
        &self,
        actor: UserId,
        requester: UserId,
    ) -> Result<RelationOutcome, RelationError> {
        ensure_distinct(actor, requester)?;
        let (state, accepter) = self
            .within_deadline("accept_friend_request", async {
                let mut tx = self.begin().await?;
                self.ensure_users_in_tx(&mut *tx, [actor, requester])
                    .await?;
                let view = self.load_pair_in_tx(&mut *tx, actor, requester).await?;
                let write = view.plan(actor, requester, FriendshipAction::Accept)?;

                if !self
                    .repos
                    .friendship
                    .delete_request_in_tx(&mut *tx, actor, requester)
                    .await?
                {
                    return Err(RelationError::FriendRequestNotFound);
                }
                // a crossing request from the actor is settled by this accept
                self.repos
                    .friendship
                    .delete_request_in_tx(&mut *tx, requester, actor)
                    .await?;

                self.apply_edge_write_in_tx(&mut *tx, actor, requester, write)
                    .await?;
                let accepter = self.profile_in_tx(&mut *tx, actor).await?;
                let state = self.state_in_tx(&mut *tx, actor, requester).await?;
                Self::commit(tx).await?;
                Ok((state, accepter))
            })
            .await?;

        let FriendshipState::Friends { conversation_id } = state else {
            return Err(RelationError::Store(format!(
                "accepted pair reports state {state:?}"
            )));
        };
        tracing::info!(%actor, %requester, %conversation_id, "friend request accepted");
        let event = S2CEvent::FriendRequestAccepted(FriendRequestAccepted {
            conversation_id,
            other: actor,
            username: accepter.username,
        });
        let notified = self.notifier.notify(requester, &event).await;
        Ok(RelationOutcome::friendship(state, notified))
    }

    async fn reject_friend_request(
        &self,
        actor: UserId,
        requester: UserId,
    ) -> Result<RelationOutcome, RelationError> {
        ensure_distinct(actor, requester)?;
        let state = self
            .within_deadline("reject_friend_request", async {
                let mut tx = self.begin().await?;
                self.ensure_users_in_tx(&mut *tx, [actor, requester])
                    .await?;
                let view = self.load_pair_in_tx(&mut *tx, actor, requester).await?;
                view.plan(actor, requester, FriendshipAction::Reject)?;

                if !self
                    .repos
                    .friendship
                    .delete_request_in_tx(&mut *tx, actor, requester)
                    .await?
                {
                    return Err(RelationError::NoPendingRequest);
                }
                let state = self.state_in_tx(&mut *tx, actor, requester).await?;
                Self::commit(tx).await?;
                Ok(state)
            })
            .await?;

        tracing::info!(%actor, %requester, "friend request rejected");
        Ok(RelationOutcome::friendship(state, false))
    }

    async fn remove_friend(
        &self,
        actor: UserId,
        peer: UserId,
    ) -> Result<RelationOutcome, RelationError> {
        let state = self
            .transition("remove_friend", actor, peer, FriendshipAction::Remove)
            .await?;
        tracing::info!(%actor, %peer, "friend removed");
        Ok(RelationOutcome::friendship(state, false))
    }

    async fn block_user(
        &self,
        actor: UserId,
        peer: UserId,
    ) -> Result<RelationOutcome, RelationError> {
        let state = self
            .transition("block_user", actor, peer, FriendshipAction::Block)
            .await?;
        tracing::info!(%actor, %peer, "user blocked");
        Ok(RelationOutcome::friendship(state, false))
    }

    async fn unblock_user(
        &self,
        actor: UserId,
        peer: UserId,
    ) -> Result<RelationOutcome, RelationError> {
        let state = self
            .transition("unblock_user", actor, peer, FriendshipAction::Unblock)
            .await?;
        tracing::info!(%actor, %peer, "user unblocked");
        Ok(RelationOutcome::friendship(state, false))
    }

    async fn follow_user(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<RelationOutcome, RelationError> {
        ensure_distinct(actor, target)?;
        let follower = self
            .within_deadline("follow_user", async {
                let mut tx = self.begin().await?;
                self.ensure_users_in_tx(&mut *tx, [actor, target]).await?;
                if self
                    .repos
                    .follow
                    .is_following_in_tx(&mut *tx, actor, target)
                    .await?
                {
                    return Err(RelationError::AlreadyFollowing);
                }
                if !self
                    .repos
                    .follow
                    .insert_in_tx(&mut *tx, actor, target, Utc::now())
                    .await?
                {
                    return Err(RelationError::AlreadyFollowing);
                }
                let follower = self.profile_in_tx(&mut *tx, actor).await?;
                Self::commit(tx).await?;
                Ok(follower)
            })
            .await?;

        tracing::info!(%actor, %target, "user followed");
        let event = S2CEvent::FollowerNew(FollowerNew {
            follower: actor,
            username: follower.username,
        });
        let notified = self.notifier.notify(target, &event).await;
        Ok(RelationOutcome::follow(FollowState::Following, notified))
    }

    async fn unfollow_user(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<RelationOutcome, RelationError> {
        ensure_distinct(actor, target)?;
        self.within_deadline("unfollow_user", async {
            let mut tx = self.begin().await?;
            self.ensure_users_in_tx(&mut *tx, [actor, target]).await?;
            if !self
                .repos
                .follow
                .delete_in_tx(&mut *tx, actor, target)
                .await?
            {
                return Err(RelationError::NotFollowing);
            }
            Self::commit(tx).await
        })
        .await?;

        tracing::info!(%actor, %target, "user unfollowed");
        Ok(RelationOutcome::follow(FollowState::NotFollowing, false))
    }

    async fn list_followers(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<PeerSummary>, RelationError> {
        self.validate_pagination(pagination)?;
        self.ensure_listed_user(user_id).await?;
        let (items, total) = self.repos.follow.list_followers(user_id, pagination).await?;
        Ok(Page::new(items, pagination, total))
    }

    async fn list_following(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<PeerSummary>, RelationError> {
        self.validate_pagination(pagination)?;
        self.ensure_listed_user(user_id).await?;
        let (items, total) = self.repos.follow.list_following(user_id, pagination).await?;
        Ok(Page::new(items, pagination, total))
    }

    async fn list_friends(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<FriendSummary>, RelationError> {
        self.validate_pagination(pagination)?;
        self.ensure_listed_user(user_id).await?;
        let (items, total) = self
            .repos
            .friendship
            .list_friends(user_id, pagination)
            .await?;
        Ok(Page::new(items, pagination, total))
    }

    async fn list_friend_requests(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<FriendRequestSummary>, RelationError> {
        self.validate_pagination(pagination)?;
        self.ensure_listed_user(user_id).await?;
        let (items, total) = self
            .repos
            .friendship
            .list_requests(user_id, pagination)
            .await?;
        Ok(Page::new(items, pagination, total))
    }

    async fn relationship(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<PairRelationship, RelationError> {
        ensure_distinct(actor, target)?;
        self.within_deadline("relationship", async {
            let mut tx = self.begin().await?;
            self.ensure_users_in_tx(&mut *tx, [actor, target]).await?;
            let view = self.load_pair_in_tx(&mut *tx, actor, target).await?;
            let following = self
                .repos
                .follow
                .is_following_in_tx(&mut *tx, actor, target)
                .await?;
            let followed_by = self
                .repos
                .follow
                .is_following_in_tx(&mut *tx, target, actor)
                .await?;
            Self::commit(tx).await?;
            Ok(PairRelationship {
                friendship: view.state(actor, target),
                following,
                followed_by,
                blocking: view.actor_blocks,
                blocked_by_peer: view.peer_blocks,
            })
        })
        .await
    }

    async fn user_relations(&self, user_id: UserId) -> Result<UserRelations, RelationError> {
        self.ensure_listed_user(user_id).await?;
        Ok(UserRelations {
            friends: self.repos.friendship.edges_of(user_id).await?,
            friend_requests: self.repos.friendship.requests_of(user_id).await?,
            followers: self.repos.follow.follower_ids(user_id).await?,
            following: self.repos.follow.following_ids(user_id).await?,
            blocked_users: self.repos.block.blocked_ids(user_id).await?,
        })
    }
}
