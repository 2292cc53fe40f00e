use crate::domain_model::*;

/// Coarse failure classes; each one maps to a distinct client-facing status.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    TransactionAborted,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("cannot target yourself")]
    SelfAction,
    #[error("malformed id: {0}")]
    MalformedId(String),
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
    #[error("user not found")]
    UserNotFound,
    #[error("friend request not found")]
    FriendRequestNotFound,
    #[error("no pending friend request from this user")]
    NoPendingRequest,
    #[error("friend request already exists")]
    FriendRequestExists,
    #[error("friendship already established")]
    AlreadyFriends,
    #[error("not friends")]
    NotFriends,
    #[error("one of the users blocks the other")]
    PairBlocked,
    #[error("user already blocked")]
    AlreadyBlocked,
    #[error("user not blocked")]
    NotBlocked,
    #[error("only the blocking user may unblock")]
    NotBlocker,
    #[error("already following")]
    AlreadyFollowing,
    #[error("not following")]
    NotFollowing,
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),
    #[error("store error: {0}")]
    Store(String),
}

impl RelationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelationError::SelfAction
            | RelationError::MalformedId(_)
            | RelationError::InvalidPagination(_) => ErrorKind::InvalidArgument,
            RelationError::UserNotFound | RelationError::FriendRequestNotFound => {
                ErrorKind::NotFound
            }
            RelationError::NoPendingRequest
            | RelationError::FriendRequestExists
            | RelationError::AlreadyFriends
            | RelationError::NotFriends
            | RelationError::PairBlocked
            | RelationError::AlreadyBlocked
            | RelationError::NotBlocked
            | RelationError::NotBlocker
            | RelationError::AlreadyFollowing
            | RelationError::NotFollowing => ErrorKind::Conflict,
            RelationError::TransactionAborted(_) => ErrorKind::TransactionAborted,
            RelationError::Store(_) => ErrorKind::Internal,
        }
    }

    /// The caller may retry the same operation once.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransactionAborted
    }
}

#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    async fn send_friend_request(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<RelationOutcome, RelationError>;
    async fn accept_friend_request(
        &self,
        actor: UserId,
        requester: UserId,
    ) -> Result<RelationOutcome, RelationError>;
    async fn reject_friend_request(
        &self,
        actor: UserId,
        requester: UserId,
    ) -> Result<RelationOutcome, RelationError>;
    async fn remove_friend(
        &self,
        actor: UserId,
        peer: UserId,
    ) -> Result<RelationOutcome, RelationError>;
    async fn block_user(&self, actor: UserId, peer: UserId)
    -> Result<RelationOutcome, RelationError>;
    async fn unblock_user(
        &self,
        actor: UserId,
        peer: UserId,
    ) -> Result<RelationOutcome, RelationError>;
    async fn follow_user(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<RelationOutcome, RelationError>;
    async fn unfollow_user(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<RelationOutcome, RelationError>;

    async fn list_followers(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<PeerSummary>, RelationError>;
    async fn list_following(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<PeerSummary>, RelationError>;
    async fn list_friends(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<FriendSummary>, RelationError>;
    async fn list_friend_requests(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<FriendRequestSummary>, RelationError>;

    async fn relationship(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<PairRelationship, RelationError>;
    async fn user_relations(&self, user_id: UserId) -> Result<UserRelations, RelationError>;
}
