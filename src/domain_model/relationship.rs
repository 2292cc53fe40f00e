//! Friend request / friendship / block state machine for one pair of users.
//!
//! Everything here is pure: the service loads a [`PairView`] inside its
//! transaction, asks it for an [`EdgeWrite`] plan and executes that plan.

use crate::application_port::RelationError;
use crate::domain_model::{ConversationId, FriendEdge, FriendStatus, UserId};
use serde::Serialize;

/// Derived state of a pair, seen from the actor's side.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FriendshipState {
    None,
    Pending { requester: UserId },
    Friends { conversation_id: ConversationId },
    Blocked { blocked_by: UserId },
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
    Following,
    NotFollowing,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(tag = "relation", content = "value", rename_all = "snake_case")]
pub enum RelationState {
    Friendship(FriendshipState),
    Follow(FollowState),
}

/// What every mutating relationship operation hands back.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct RelationOutcome {
    pub state: RelationState,
    pub notified_peer: bool,
}

impl RelationOutcome {
    pub fn friendship(state: FriendshipState, notified_peer: bool) -> Self {
        Self {
            state: RelationState::Friendship(state),
            notified_peer,
        }
    }

    pub fn follow(state: FollowState, notified_peer: bool) -> Self {
        Self {
            state: RelationState::Follow(state),
            notified_peer,
        }
    }
}

/// Full picture of a pair for the `relationship` query.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct PairRelationship {
    pub friendship: FriendshipState,
    pub following: bool,
    pub followed_by: bool,
    pub blocking: bool,
    pub blocked_by_peer: bool,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FriendshipAction {
    Request,
    Accept,
    Reject,
    Remove,
    Block,
    Unblock,
}

/// Write to apply to the mirrored edge pair once a transition is allowed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EdgeWrite {
    Keep,
    /// Both accepted edges, carrying a freshly provisioned conversation.
    CreateAccepted,
    CreateBlocked { blocked_by: UserId },
    SetBlocked { blocked_by: UserId },
    RestoreAccepted,
    Delete,
}

/// Everything the state machine needs to know about `actor` → `peer`.
#[derive(Debug, Clone, Default)]
pub struct PairView {
    /// The actor's edge toward the peer (the peer holds the mirror).
    pub edge: Option<FriendEdge>,
    /// The actor holds a request from the peer.
    pub inbound_request: bool,
    /// The peer holds a request from the actor.
    pub outbound_request: bool,
    pub actor_blocks: bool,
    pub peer_blocks: bool,
}

impl PairView {
    fn edge_status(&self) -> Option<FriendStatus> {
        self.edge.as_ref().map(|e| e.status)
    }

    fn edge_blocked_by(&self) -> Option<UserId> {
        self.edge
            .as_ref()
            .filter(|e| e.status == FriendStatus::Blocked)
            .and_then(|e| e.blocked_by)
    }

    fn is_blocked(&self) -> bool {
        self.edge_status() == Some(FriendStatus::Blocked) || self.actor_blocks || self.peer_blocks
    }

    pub fn state(&self, actor: UserId, peer: UserId) -> FriendshipState {
        if let Some(edge) = &self.edge {
            match (edge.status, edge.conversation_id) {
                (FriendStatus::Blocked, _) => {
                    let fallback = if self.actor_blocks { actor } else { peer };
                    return FriendshipState::Blocked {
                        blocked_by: edge.blocked_by.unwrap_or(fallback),
                    };
                }
                (FriendStatus::Accepted, Some(conversation_id)) => {
                    return FriendshipState::Friends { conversation_id };
                }
                (FriendStatus::Accepted, None) => {}
            }
        }
        if self.actor_blocks {
            FriendshipState::Blocked { blocked_by: actor }
        } else if self.peer_blocks {
            FriendshipState::Blocked { blocked_by: peer }
        } else if self.inbound_request {
            FriendshipState::Pending { requester: peer }
        } else if self.outbound_request {
            FriendshipState::Pending { requester: actor }
        } else {
            FriendshipState::None
        }
    }

    /// Validates `action` by `actor` against the current pair and returns
    /// the edge write it implies. Request bookkeeping (append, consume,
    /// clear) is left to the caller.
    pub fn plan(
        &self,
        actor: UserId,
        peer: UserId,
        action: FriendshipAction,
    ) -> Result<EdgeWrite, RelationError> {
        match action {
            FriendshipAction::Request => {
                if self.edge_status() == Some(FriendStatus::Accepted) {
                    return Err(RelationError::AlreadyFriends);
                }
                if self.is_blocked() {
                    return Err(RelationError::PairBlocked);
                }
                if self.outbound_request {
                    return Err(RelationError::FriendRequestExists);
                }
                Ok(EdgeWrite::Keep)
            }
            FriendshipAction::Accept => {
                if self.edge_status() == Some(FriendStatus::Accepted) {
                    return Err(RelationError::AlreadyFriends);
                }
                if !self.inbound_request {
                    return Err(RelationError::FriendRequestNotFound);
                }
                if self.is_blocked() {
                    return Err(RelationError::PairBlocked);
                }
                Ok(EdgeWrite::CreateAccepted)
            }
            FriendshipAction::Reject => {
                if !self.inbound_request {
                    return Err(RelationError::NoPendingRequest);
                }
                Ok(EdgeWrite::Keep)
            }
            FriendshipAction::Remove => match self.edge_status() {
                Some(FriendStatus::Accepted) => Ok(EdgeWrite::Delete),
                _ => Err(RelationError::NotFriends),
            },
            FriendshipAction::Block => {
                if self.actor_blocks {
                    return Err(RelationError::AlreadyBlocked);
                }
                Ok(match self.edge_status() {
                    None => EdgeWrite::CreateBlocked { blocked_by: actor },
                    Some(FriendStatus::Accepted) => EdgeWrite::SetBlocked { blocked_by: actor },
                    // the peer's block keeps governing the edge
                    Some(FriendStatus::Blocked) if self.edge_blocked_by() == Some(peer) => {
                        EdgeWrite::Keep
                    }
                    Some(FriendStatus::Blocked) => EdgeWrite::SetBlocked { blocked_by: actor },
                })
            }
            FriendshipAction::Unblock => {
                if !self.actor_blocks {
                    return Err(if self.edge_blocked_by() == Some(peer) || self.peer_blocks {
                        RelationError::NotBlocker
                    } else {
                        RelationError::NotBlocked
                    });
                }
                let Some(edge) = &self.edge else {
                    return Ok(EdgeWrite::Keep);
                };
                if edge.status != FriendStatus::Blocked || self.edge_blocked_by() == Some(peer) {
                    return Ok(EdgeWrite::Keep);
                }
                Ok(if self.peer_blocks {
                    EdgeWrite::SetBlocked { blocked_by: peer }
                } else if edge.was_friendship() {
                    EdgeWrite::RestoreAccepted
                } else {
                    EdgeWrite::Delete
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ids() -> (UserId, UserId) {
        (UserId::new_v4(), UserId::new_v4())
    }

    fn friends(peer: UserId) -> PairView {
        PairView {
            edge: Some(FriendEdge::accepted(peer, ConversationId::new_v4(), Utc::now())),
            ..Default::default()
        }
    }

    #[test]
    fn request_from_none_is_allowed_once() {
        let (a, b) = ids();
        let view = PairView::default();
        assert_eq!(view.state(a, b), FriendshipState::None);
        assert_eq!(view.plan(a, b, FriendshipAction::Request).unwrap(), EdgeWrite::Keep);

        let pending = PairView {
            outbound_request: true,
            ..Default::default()
        };
        assert_eq!(pending.state(a, b), FriendshipState::Pending { requester: a });
        assert!(matches!(
            pending.plan(a, b, FriendshipAction::Request),
            Err(RelationError::FriendRequestExists)
        ));
    }

    #[test]
    fn request_between_friends_conflicts() {
        let (a, b) = ids();
        assert!(matches!(
            friends(b).plan(a, b, FriendshipAction::Request),
            Err(RelationError::AlreadyFriends)
        ));
    }

    #[test]
    fn request_to_blocking_peer_conflicts() {
        let (a, b) = ids();
        let view = PairView {
            edge: Some(FriendEdge::blocked(b, b, Utc::now())),
            peer_blocks: true,
            ..Default::default()
        };
        assert!(matches!(
            view.plan(a, b, FriendshipAction::Request),
            Err(RelationError::PairBlocked)
        ));
    }

    #[test]
    fn accept_needs_an_inbound_request() {
        let (a, b) = ids();
        assert!(matches!(
            PairView::default().plan(a, b, FriendshipAction::Accept),
            Err(RelationError::FriendRequestNotFound)
        ));
        let view = PairView {
            inbound_request: true,
            ..Default::default()
        };
        assert_eq!(view.state(a, b), FriendshipState::Pending { requester: b });
        assert_eq!(
            view.plan(a, b, FriendshipAction::Accept).unwrap(),
            EdgeWrite::CreateAccepted
        );
    }

    #[test]
    fn reject_without_request_is_a_conflict() {
        let (a, b) = ids();
        let err = PairView::default()
            .plan(a, b, FriendshipAction::Reject)
            .unwrap_err();
        assert_eq!(err.kind(), crate::application_port::ErrorKind::Conflict);
    }

    #[test]
    fn remove_only_from_friends() {
        let (a, b) = ids();
        assert_eq!(friends(b).plan(a, b, FriendshipAction::Remove).unwrap(), EdgeWrite::Delete);
        assert!(matches!(
            PairView::default().plan(a, b, FriendshipAction::Remove),
            Err(RelationError::NotFriends)
        ));
    }

    #[test]
    fn block_sets_or_creates_the_edge() {
        let (a, b) = ids();
        assert_eq!(
            friends(b).plan(a, b, FriendshipAction::Block).unwrap(),
            EdgeWrite::SetBlocked { blocked_by: a }
        );
        assert_eq!(
            PairView::default().plan(a, b, FriendshipAction::Block).unwrap(),
            EdgeWrite::CreateBlocked { blocked_by: a }
        );
        let blocked_by_peer = PairView {
            edge: Some(FriendEdge::blocked(b, b, Utc::now())),
            peer_blocks: true,
            ..Default::default()
        };
        assert_eq!(
            blocked_by_peer.plan(a, b, FriendshipAction::Block).unwrap(),
            EdgeWrite::Keep
        );
    }

    #[test]
    fn unblock_restores_only_prior_friendships() {
        let (a, b) = ids();
        let mut edge = FriendEdge::accepted(b, ConversationId::new_v4(), Utc::now());
        edge.status = FriendStatus::Blocked;
        edge.blocked_by = Some(a);
        let was_friends = PairView {
            edge: Some(edge),
            actor_blocks: true,
            ..Default::default()
        };
        assert_eq!(was_friends.state(a, b), FriendshipState::Blocked { blocked_by: a });
        assert_eq!(
            was_friends.plan(a, b, FriendshipAction::Unblock).unwrap(),
            EdgeWrite::RestoreAccepted
        );

        let strangers = PairView {
            edge: Some(FriendEdge::blocked(b, a, Utc::now())),
            actor_blocks: true,
            ..Default::default()
        };
        assert_eq!(
            strangers.plan(a, b, FriendshipAction::Unblock).unwrap(),
            EdgeWrite::Delete
        );
    }

    #[test]
    fn unblock_hands_the_edge_to_a_peer_still_blocking() {
        let (a, b) = ids();
        let view = PairView {
            edge: Some(FriendEdge::blocked(b, a, Utc::now())),
            actor_blocks: true,
            peer_blocks: true,
            ..Default::default()
        };
        assert_eq!(
            view.plan(a, b, FriendshipAction::Unblock).unwrap(),
            EdgeWrite::SetBlocked { blocked_by: b }
        );
    }

    #[test]
    fn only_the_blocker_may_unblock() {
        let (a, b) = ids();
        let view = PairView {
            edge: Some(FriendEdge::blocked(b, b, Utc::now())),
            peer_blocks: true,
            ..Default::default()
        };
        assert!(matches!(
            view.plan(a, b, FriendshipAction::Unblock),
            Err(RelationError::NotBlocker)
        ));
        assert!(matches!(
            PairView::default().plan(a, b, FriendshipAction::Unblock),
            Err(RelationError::NotBlocked)
        ));
    }

    #[test]
    fn relation_state_serializes_with_tags() {
        let (a, _) = ids();
        let json = serde_json::to_value(RelationOutcome::friendship(
            FriendshipState::Pending { requester: a },
            true,
        ))
        .unwrap();
        assert_eq!(json["state"]["relation"], "friendship");
        assert_eq!(json["state"]["value"]["state"], "pending");
        assert_eq!(json["notified_peer"], true);

        let json = serde_json::to_value(RelationOutcome::follow(FollowState::Following, false))
            .unwrap();
        assert_eq!(json["state"]["value"], "following");
    }
}
