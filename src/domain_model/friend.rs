use crate::domain_model::{ConversationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Persisted status of a friend edge. A pending request lives in the
/// recipient's request list, never as an edge.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Accepted,
    Blocked,
}

impl fmt::Display for FriendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FriendStatus::Accepted => "accepted",
            FriendStatus::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

impl FromStr for FriendStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(FriendStatus::Accepted),
            "blocked" => Ok(FriendStatus::Blocked),
            other => Err(format!("unknown friend status: {other}")),
        }
    }
}

/// One side of a mirrored friend edge, as stored under its owner.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FriendEdge {
    pub peer_id: UserId,
    pub status: FriendStatus,
    pub blocked_by: Option<UserId>,
    pub conversation_id: Option<ConversationId>,
    pub since: DateTime<Utc>,
}

impl FriendEdge {
    pub fn accepted(peer_id: UserId, conversation_id: ConversationId, since: DateTime<Utc>) -> Self {
        Self {
            peer_id,
            status: FriendStatus::Accepted,
            blocked_by: None,
            conversation_id: Some(conversation_id),
            since,
        }
    }

    pub fn blocked(peer_id: UserId, blocked_by: UserId, since: DateTime<Utc>) -> Self {
        Self {
            peer_id,
            status: FriendStatus::Blocked,
            blocked_by: Some(blocked_by),
            conversation_id: None,
            since,
        }
    }

    /// The same edge as seen from the peer's side.
    pub fn mirrored(&self, owner: UserId) -> Self {
        Self {
            peer_id: owner,
            ..self.clone()
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == FriendStatus::Accepted
    }

    /// Accepted friendships always carry a conversation; a block that
    /// preceded any friendship never does.
    pub fn was_friendship(&self) -> bool {
        self.conversation_id.is_some()
    }
}

/// Inbound, unconfirmed request stored under its recipient.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FriendRequest {
    pub from_id: UserId,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendSummary {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub status: FriendStatus,
    pub blocked_by: Option<UserId>,
    pub conversation_id: Option<ConversationId>,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestSummary {
    pub from_id: UserId,
    pub username: String,
    pub display_name: String,
    pub since: DateTime<Utc>,
}

/// A follower, followee or any other populated peer reference.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct PeerSummary {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
}

/// Every relationship collection held for one user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserRelations {
    pub friends: Vec<FriendEdge>,
    pub friend_requests: Vec<FriendRequest>,
    pub followers: Vec<UserId>,
    pub following: Vec<UserId>,
    pub blocked_users: Vec<UserId>,
}

impl UserRelations {
    pub fn friend(&self, peer: UserId) -> Option<&FriendEdge> {
        self.friends.iter().find(|e| e.peer_id == peer)
    }

    pub fn has_request_from(&self, from: UserId) -> bool {
        self.friend_requests.iter().any(|r| r.from_id == from)
    }
}
