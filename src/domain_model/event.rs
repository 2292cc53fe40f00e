use crate::domain_model::{ConversationId, UserId};
use serde::{Deserialize, Serialize};

/// Server-to-client events pushed over a live connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum S2CEvent {
    #[serde(rename = "friend.request.received")]
    FriendRequestReceived(FriendRequestReceived),
    #[serde(rename = "friend.request.accepted")]
    FriendRequestAccepted(FriendRequestAccepted),
    #[serde(rename = "follower.new")]
    FollowerNew(FollowerNew),
}

impl S2CEvent {
    pub fn name(&self) -> &'static str {
        match self {
            S2CEvent::FriendRequestReceived(_) => "friend.request.received",
            S2CEvent::FriendRequestAccepted(_) => "friend.request.accepted",
            S2CEvent::FollowerNew(_) => "follower.new",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestReceived {
    pub from: UserId,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestAccepted {
    pub conversation_id: ConversationId,
    pub other: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowerNew {
    pub follower: UserId,
    pub username: String,
}
