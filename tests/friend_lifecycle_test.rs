mod common;

use campus_graph::application_port::*;
use campus_graph::domain_model::*;
use campus_graph::domain_port::*;
use common::*;

#[tokio::test]
async fn duplicate_request_conflicts() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    let outcome = graph.service.send_friend_request(alice, bob).await.unwrap();
    assert_eq!(
        friendship(&outcome),
        FriendshipState::Pending { requester: alice }
    );

    let err = graph
        .service
        .send_friend_request(alice, bob)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationError::FriendRequestExists));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(graph.relations(bob).await.friend_requests.len(), 1);
}

#[tokio::test]
async fn accept_mirrors_edges_and_consumes_request() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    graph.service.send_friend_request(alice, bob).await.unwrap();
    let outcome = graph.service.accept_friend_request(bob, alice).await.unwrap();
    let FriendshipState::Friends { conversation_id } = friendship(&outcome) else {
        panic!("expected friends, got {outcome:?}");
    };

    let a = graph.relations(alice).await;
    let b = graph.relations(bob).await;
    let a_edge = a.friend(bob).unwrap();
    let b_edge = b.friend(alice).unwrap();
    assert_eq!(a_edge.status, FriendStatus::Accepted);
    assert_eq!(b_edge.status, FriendStatus::Accepted);
    assert_eq!(a_edge.conversation_id, Some(conversation_id));
    assert_eq!(b_edge.conversation_id, Some(conversation_id));
    assert_eq!(a_edge.since, b_edge.since);
    assert!(!b.has_request_from(alice));

    let members = graph
        .handles
        .conversation_repo
        .get_members(conversation_id)
        .await
        .unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.contains(&alice) && members.contains(&bob));
}

#[tokio::test]
async fn accepting_absent_request_changes_nothing() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    let err = graph
        .service
        .accept_friend_request(bob, alice)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationError::FriendRequestNotFound));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    for user in [alice, bob] {
        let relations = graph.relations(user).await;
        assert!(relations.friends.is_empty());
        assert!(relations.friend_requests.is_empty());
    }
    assert_eq!(graph.store.conversation_count().await, 0);
}

#[tokio::test]
async fn reject_without_request_is_not_idempotent() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    graph.service.send_friend_request(alice, bob).await.unwrap();
    let outcome = graph.service.reject_friend_request(bob, alice).await.unwrap();
    assert_eq!(friendship(&outcome), FriendshipState::None);
    assert!(!outcome.notified_peer);

    let err = graph
        .service
        .reject_friend_request(bob, alice)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationError::NoPendingRequest));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn request_accept_remove_scenario() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    graph.befriend(alice, bob).await;
    let err = graph
        .service
        .send_friend_request(bob, alice)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationError::AlreadyFriends));

    let outcome = graph.service.remove_friend(alice, bob).await.unwrap();
    assert_eq!(friendship(&outcome), FriendshipState::None);
    assert!(graph.relations(alice).await.friends.is_empty());
    assert!(graph.relations(bob).await.friends.is_empty());

    let err = graph.service.remove_friend(bob, alice).await.unwrap_err();
    assert!(matches!(err, RelationError::NotFriends));
}

#[tokio::test]
async fn refriending_resumes_the_same_conversation() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    let first = graph.befriend(alice, bob).await;
    graph.service.remove_friend(bob, alice).await.unwrap();
    let second = graph.befriend(bob, alice).await;

    assert_eq!(first, second);
    assert_eq!(graph.store.conversation_count().await, 1);
}

#[tokio::test]
async fn crossing_requests_are_settled_by_one_accept() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    graph.service.send_friend_request(alice, bob).await.unwrap();
    graph.service.send_friend_request(bob, alice).await.unwrap();
    graph.service.accept_friend_request(alice, bob).await.unwrap();

    assert!(graph.relations(alice).await.friend_requests.is_empty());
    assert!(graph.relations(bob).await.friend_requests.is_empty());
    assert!(graph.relations(alice).await.friend(bob).unwrap().is_accepted());
}

#[tokio::test]
async fn self_actions_fail_before_any_write() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;

    for err in [
        graph.service.send_friend_request(alice, alice).await.unwrap_err(),
        graph.service.accept_friend_request(alice, alice).await.unwrap_err(),
        graph.service.block_user(alice, alice).await.unwrap_err(),
        graph.service.follow_user(alice, alice).await.unwrap_err(),
    ] {
        assert!(matches!(err, RelationError::SelfAction));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
    let relations = graph.relations(alice).await;
    assert!(relations.friend_requests.is_empty());
    assert!(relations.following.is_empty());
    assert!(relations.blocked_users.is_empty());
}

#[tokio::test]
async fn unknown_users_are_not_found() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let ghost = UserId::new_v4();

    let err = graph
        .service
        .send_friend_request(alice, ghost)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationError::UserNotFound));
    let err = graph
        .service
        .list_friends(ghost, first_page())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn online_peers_receive_events() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;
    let mut alice_live = graph.connect(alice).await;
    let mut bob_live = graph.connect(bob).await;

    let outcome = graph.service.send_friend_request(alice, bob).await.unwrap();
    assert!(outcome.notified_peer);
    let event = bob_live.next_event().await;
    assert_eq!(event["type"], "friend.request.received");
    assert_eq!(event["content"]["from"], alice.to_string());
    assert_eq!(event["content"]["username"], "alice");

    let outcome = graph.service.accept_friend_request(bob, alice).await.unwrap();
    assert!(outcome.notified_peer);
    let FriendshipState::Friends { conversation_id } = friendship(&outcome) else {
        panic!("expected friends");
    };
    let event = alice_live.next_event().await;
    assert_eq!(event["type"], "friend.request.accepted");
    assert_eq!(event["content"]["conversation_id"], conversation_id.to_string());
    assert_eq!(event["content"]["other"], bob.to_string());
}

#[tokio::test]
async fn offline_peer_is_reported_as_not_notified() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    let outcome = graph.service.send_friend_request(alice, bob).await.unwrap();
    assert!(!outcome.notified_peer);
    assert!(graph.relations(bob).await.has_request_from(alice));
}

#[tokio::test]
async fn listings_are_populated_and_paged() {
    let graph = TestGraph::new();
    let hub_user = graph.user("hub").await;
    let mut senders = Vec::new();
    for name in ["s1", "s2", "s3"] {
        let id = graph.user(name).await;
        graph.service.send_friend_request(id, hub_user).await.unwrap();
        senders.push(id);
    }

    let page = graph
        .service
        .list_friend_requests(hub_user, Pagination::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    let ids: Vec<_> = page.items.iter().map(|r| r.from_id).collect();
    assert_eq!(ids, senders[..2]);
    assert_eq!(page.items[0].username, "s1");
    assert_eq!(page.items[0].display_name, "s1 (display)");

    graph.service.accept_friend_request(hub_user, senders[2]).await.unwrap();
    let friends = graph
        .service
        .list_friends(hub_user, first_page())
        .await
        .unwrap();
    assert_eq!(friends.total, 1);
    assert_eq!(friends.items[0].user_id, senders[2]);
    assert_eq!(friends.items[0].status, FriendStatus::Accepted);
}
