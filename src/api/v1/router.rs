use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::domain_model::UserId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let auth = || with_verification(server.token_verifier.clone());
    let service = || with(server.relationship_service.clone());

    let send_request = warp::path!("friends" / "requests")
        .and(warp::post())
        .and(warp::body::json())
        .and(auth())
        .and(service())
        .and_then(handler::send_friend_request);

    let list_requests = warp::path!("friends" / "requests")
        .and(warp::get())
        .and(warp::query::<handler::PageQuery>())
        .and(auth())
        .and(service())
        .and_then(handler::list_friend_requests);

    let accept_request = warp::path!("friends" / "requests" / String / "accept")
        .and(warp::post())
        .and(auth())
        .and(service())
        .and_then(handler::accept_friend_request);

    let reject_request = warp::path!("friends" / "requests" / String / "reject")
        .and(warp::post())
        .and(auth())
        .and(service())
        .and_then(handler::reject_friend_request);

    let list_friends = warp::path!("friends")
        .and(warp::get())
        .and(warp::query::<handler::PageQuery>())
        .and(auth())
        .and(service())
        .and_then(handler::list_friends);

    let remove_friend = warp::path!("friends" / String)
        .and(warp::delete())
        .and(auth())
        .and(service())
        .and_then(handler::remove_friend);

    let block = warp::path!("blocks" / String)
        .and(warp::post())
        .and(auth())
        .and(service())
        .and_then(handler::block_user);

    let unblock = warp::path!("blocks" / String)
        .and(warp::delete())
        .and(auth())
        .and(service())
        .and_then(handler::unblock_user);

    let follow = warp::path!("follows" / String)
        .and(warp::post())
        .and(auth())
        .and(service())
        .and_then(handler::follow_user);

    let unfollow = warp::path!("follows" / String)
        .and(warp::delete())
        .and(auth())
        .and(service())
        .and_then(handler::unfollow_user);

    let followers = warp::path!("users" / String / "followers")
        .and(warp::get())
        .and(warp::query::<handler::PageQuery>())
        .and(auth())
        .and(service())
        .and_then(handler::list_followers);

    let following = warp::path!("users" / String / "following")
        .and(warp::get())
        .and(warp::query::<handler::PageQuery>())
        .and(auth())
        .and(service())
        .and_then(handler::list_following);

    let relationship = warp::path!("users" / String / "relationship")
        .and(warp::get())
        .and(auth())
        .and(service())
        .and_then(handler::relationship);

    let live = warp::path!("live")
        .and(warp::get())
        .and(auth())
        .and(warp::ws())
        .and(with(server.connection_acceptor.clone()))
        .map(
            |user_id: UserId,
             ws: warp::ws::Ws,
             connection_acceptor: Arc<dyn ConnectionAcceptor>| {
                ws.on_upgrade(move |socket| {
                    handler::join_live(socket, user_id, connection_acceptor)
                })
            },
        );

    let friend_routes = send_request
        .or(list_requests)
        .or(accept_request)
        .or(reject_request)
        .or(list_friends)
        .or(remove_friend)
        .boxed();
    let edge_routes = block.or(unblock).or(follow).or(unfollow).boxed();
    let user_routes = followers.or(following).or(relationship).boxed();

    friend_routes
        .or(edge_routes)
        .or(user_routes)
        .or(live)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    token_verifier: Arc<dyn TokenVerifier>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |token: String| {
        let token_verifier = token_verifier.clone();
        async move {
            if let Some(token) = token.strip_prefix("Bearer ") {
                let user_id = token_verifier
                    .verify_token(token)
                    .await
                    .map_err(ApiError::from)
                    .map_err(reject::custom)?;
                Ok(user_id)
            } else {
                Err(reject::custom(ApiError::new(
                    ApiErrorCode::InvalidToken,
                    "expected a bearer token",
                )))
            }
        }
    })
}
