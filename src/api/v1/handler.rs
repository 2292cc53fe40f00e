use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use crate::server::ConnectionAcceptor;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

fn reply<T: Serialize>(data: T) -> warp::reply::Json {
    warp::reply::json(&ApiResponse::ok(data))
}

fn reject_with(error: impl Into<ApiError>) -> warp::Rejection {
    reject::custom(error.into())
}

pub fn parse_user_id(raw: &str) -> Result<UserId, warp::Rejection> {
    raw.parse::<UserId>()
        .map_err(|_| reject_with(RelationError::MalformedId(raw.to_owned())))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u16>,
}

impl PageQuery {
    fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination::new(
            self.page.unwrap_or(default.page),
            self.limit.unwrap_or(default.limit.0),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub target: String,
}

// region friend requests

pub async fn send_friend_request(
    body: FriendRequestBody,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let target = parse_user_id(&body.target)?;
    let outcome = relationship_service
        .send_friend_request(user_id, target)
        .await
        .map_err(reject_with)?;
    Ok(reply(outcome))
}

pub async fn list_friend_requests(
    query: PageQuery,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page = relationship_service
        .list_friend_requests(user_id, query.pagination())
        .await
        .map_err(reject_with)?;
    Ok(reply(page))
}

pub async fn accept_friend_request(
    requester: String,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let requester = parse_user_id(&requester)?;
    let outcome = relationship_service
        .accept_friend_request(user_id, requester)
        .await
        .map_err(reject_with)?;
    Ok(reply(outcome))
}

pub async fn reject_friend_request(
    requester: String,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let requester = parse_user_id(&requester)?;
    let outcome = relationship_service
        .reject_friend_request(user_id, requester)
        .await
        .map_err(reject_with)?;
    Ok(reply(outcome))
}

// endregion

// region friends and blocks

pub async fn list_friends(
    query: PageQuery,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page = relationship_service
        .list_friends(user_id, query.pagination())
        .await
        .map_err(reject_with)?;
    Ok(reply(page))
}

pub async fn remove_friend(
    peer: String,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let peer = parse_user_id(&peer)?;
    let outcome = relationship_service
        .remove_friend(user_id, peer)
        .await
        .map_err(reject_with)?;
    Ok(reply(outcome))
}

pub async fn block_user(
    peer: String,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let peer = parse_user_id(&peer)?;
    let outcome = relationship_service
        .block_user(user_id, peer)
        .await
        .map_err(reject_with)?;
    Ok(reply(outcome))
}

pub async fn unblock_user(
    peer: String,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let peer = parse_user_id(&peer)?;
    let outcome = relationship_service
        .unblock_user(user_id, peer)
        .await
        .map_err(reject_with)?;
    Ok(reply(outcome))
}

// endregion

// region follows

pub async fn follow_user(
    target: String,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let target = parse_user_id(&target)?;
    let outcome = relationship_service
        .follow_user(user_id, target)
        .await
        .map_err(reject_with)?;
    Ok(reply(outcome))
}

pub async fn unfollow_user(
    target: String,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let target = parse_user_id(&target)?;
    let outcome = relationship_service
        .unfollow_user(user_id, target)
        .await
        .map_err(reject_with)?;
    Ok(reply(outcome))
}

pub async fn list_followers(
    target: String,
    query: PageQuery,
    _user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let target = parse_user_id(&target)?;
    let page = relationship_service
        .list_followers(target, query.pagination())
        .await
        .map_err(reject_with)?;
    Ok(reply(page))
}

pub async fn list_following(
    target: String,
    query: PageQuery,
    _user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let target = parse_user_id(&target)?;
    let page = relationship_service
        .list_following(target, query.pagination())
        .await
        .map_err(reject_with)?;
    Ok(reply(page))
}

// endregion

pub async fn relationship(
    target: String,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let target = parse_user_id(&target)?;
    let relation = relationship_service
        .relationship(user_id, target)
        .await
        .map_err(reject_with)?;
    Ok(reply(relation))
}

pub async fn join_live(
    socket: warp::ws::WebSocket,
    user_id: UserId,
    connection_acceptor: Arc<dyn ConnectionAcceptor>,
) {
    let (s2c, c2s) = socket.split();
    if let Err(e) = connection_acceptor
        .accept_connection(Box::new(s2c), Box::new(c2s), user_id)
        .await
    {
        error!("accepting connection: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults() {
        let pagination = PageQuery::default().pagination();
        assert_eq!(pagination, Pagination::new(1, 20));
        let pagination = PageQuery {
            page: Some(3),
            limit: None,
        }
        .pagination();
        assert_eq!(pagination, Pagination::new(3, 20));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(parse_user_id("42").is_err());
        assert!(parse_user_id(&UserId::new_v4().to_string()).is_ok());
    }
}
