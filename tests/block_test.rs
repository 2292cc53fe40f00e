mod common;

use campus_graph::application_port::*;
use campus_graph::domain_model::*;
use common::*;

#[tokio::test]
async fn blocking_a_friend_marks_both_edges() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;
    let conversation_id = graph.befriend(alice, bob).await;

    let outcome = graph.service.block_user(alice, bob).await.unwrap();
    assert_eq!(
        friendship(&outcome),
        FriendshipState::Blocked { blocked_by: alice }
    );

    for (owner, peer) in [(alice, bob), (bob, alice)] {
        let relations = graph.relations(owner).await;
        let edge = relations.friend(peer).unwrap();
        assert_eq!(edge.status, FriendStatus::Blocked);
        assert_eq!(edge.blocked_by, Some(alice));
        assert_eq!(edge.conversation_id, Some(conversation_id));
    }
    assert_eq!(graph.relations(alice).await.blocked_users, vec![bob]);
    assert!(graph.relations(bob).await.blocked_users.is_empty());

    let err = graph.service.remove_friend(bob, alice).await.unwrap_err();
    assert!(matches!(err, RelationError::NotFriends));
}

#[tokio::test]
async fn only_the_blocker_may_unblock() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;
    graph.befriend(alice, bob).await;
    graph.service.block_user(alice, bob).await.unwrap();

    let err = graph.service.unblock_user(bob, alice).await.unwrap_err();
    assert!(matches!(err, RelationError::NotBlocker));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        graph.relations(bob).await.friend(alice).unwrap().status,
        FriendStatus::Blocked
    );
}

#[tokio::test]
async fn unblocking_a_former_friend_restores_the_friendship() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;
    let conversation_id = graph.befriend(alice, bob).await;
    graph.service.block_user(alice, bob).await.unwrap();

    let outcome = graph.service.unblock_user(alice, bob).await.unwrap();
    assert_eq!(
        friendship(&outcome),
        FriendshipState::Friends { conversation_id }
    );
    let edge = graph.relations(bob).await.friend(alice).cloned().unwrap();
    assert!(edge.is_accepted());
    assert_eq!(edge.blocked_by, None);
    assert!(graph.relations(alice).await.blocked_users.is_empty());
}

#[tokio::test]
async fn unblocking_a_stranger_leaves_no_edge() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    graph.service.block_user(alice, bob).await.unwrap();
    let edge = graph.relations(bob).await.friend(alice).cloned().unwrap();
    assert_eq!(edge.status, FriendStatus::Blocked);
    assert_eq!(edge.conversation_id, None);

    let outcome = graph.service.unblock_user(alice, bob).await.unwrap();
    assert_eq!(friendship(&outcome), FriendshipState::None);
    assert!(graph.relations(alice).await.friends.is_empty());
    assert!(graph.relations(bob).await.friends.is_empty());

    let err = graph.service.unblock_user(alice, bob).await.unwrap_err();
    assert!(matches!(err, RelationError::NotBlocked));
}

#[tokio::test]
async fn blocking_twice_conflicts() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    graph.service.block_user(alice, bob).await.unwrap();
    let err = graph.service.block_user(alice, bob).await.unwrap_err();
    assert!(matches!(err, RelationError::AlreadyBlocked));
    assert_eq!(graph.relations(alice).await.blocked_users, vec![bob]);
}

#[tokio::test]
async fn block_discards_pending_requests_both_ways() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    graph.service.send_friend_request(alice, bob).await.unwrap();
    graph.service.send_friend_request(bob, alice).await.unwrap();
    graph.service.block_user(bob, alice).await.unwrap();

    assert!(graph.relations(alice).await.friend_requests.is_empty());
    assert!(graph.relations(bob).await.friend_requests.is_empty());
    let err = graph
        .service
        .accept_friend_request(bob, alice)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationError::FriendRequestNotFound));
}

#[tokio::test]
async fn requests_across_a_block_conflict() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;
    graph.service.block_user(bob, alice).await.unwrap();

    for (from, to) in [(alice, bob), (bob, alice)] {
        let err = graph
            .service
            .send_friend_request(from, to)
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::PairBlocked));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
    assert!(graph.relations(alice).await.friend_requests.is_empty());
    assert!(graph.relations(bob).await.friend_requests.is_empty());
}

#[tokio::test]
async fn mutual_block_hands_the_edge_to_the_remaining_blocker() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    graph.service.block_user(alice, bob).await.unwrap();
    let outcome = graph.service.block_user(bob, alice).await.unwrap();
    // the first block keeps governing the shared edge
    assert_eq!(
        friendship(&outcome),
        FriendshipState::Blocked { blocked_by: alice }
    );
    assert_eq!(graph.relations(bob).await.blocked_users, vec![alice]);

    let outcome = graph.service.unblock_user(alice, bob).await.unwrap();
    assert_eq!(
        friendship(&outcome),
        FriendshipState::Blocked { blocked_by: bob }
    );
    let edge = graph.relations(alice).await.friend(bob).cloned().unwrap();
    assert_eq!(edge.blocked_by, Some(bob));

    let err = graph
        .service
        .send_friend_request(alice, bob)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationError::PairBlocked));

    let outcome = graph.service.unblock_user(bob, alice).await.unwrap();
    assert_eq!(friendship(&outcome), FriendshipState::None);
    assert!(graph.relations(alice).await.friends.is_empty());
}

#[tokio::test]
async fn relationship_reports_both_directions() {
    let graph = TestGraph::new();
    let alice = graph.user("alice").await;
    let bob = graph.user("bob").await;

    graph.service.follow_user(bob, alice).await.unwrap();
    graph.service.block_user(alice, bob).await.unwrap();

    let from_alice = graph.service.relationship(alice, bob).await.unwrap();
    assert!(from_alice.blocking);
    assert!(!from_alice.blocked_by_peer);
    assert!(from_alice.followed_by);
    assert_eq!(
        from_alice.friendship,
        FriendshipState::Blocked { blocked_by: alice }
    );

    let from_bob = graph.service.relationship(bob, alice).await.unwrap();
    assert!(!from_bob.blocking);
    assert!(from_bob.blocked_by_peer);
    assert!(from_bob.following);

    let err = graph.service.relationship(alice, alice).await.unwrap_err();
    assert!(matches!(err, RelationError::SelfAction));
}
