//! Shared fixtures: an in-memory relationship graph with a live session hub.

#![allow(dead_code)]

use campus_graph::application_impl::*;
use campus_graph::application_port::*;
use campus_graph::domain_model::*;
use campus_graph::domain_port::*;
use campus_graph::infra_memory::*;
use campus_graph::server::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{Receiver, Sender};

pub struct TestGraph {
    pub store: MemoryStore,
    pub handles: StoreHandles,
    pub hub: Arc<SessionHub>,
    pub service: Arc<dyn RelationshipService>,
}

impl TestGraph {
    pub fn new() -> Self {
        Self::with_config(RelationshipConfig::default())
    }

    pub fn with_config(config: RelationshipConfig) -> Self {
        Self::build(config, |repo| -> Arc<dyn ConversationProvisioner> {
            Arc::new(RealConversationProvisioner::new(repo))
        })
    }

    pub fn build(
        config: RelationshipConfig,
        provisioner: impl FnOnce(Arc<dyn ConversationRepo>) -> Arc<dyn ConversationProvisioner>,
    ) -> Self {
        let store = MemoryStore::new();
        let handles = StoreHandles::memory(store.clone());
        let hub = Arc::new(SessionHub::new());
        let presence: Arc<dyn PresenceLookup> = hub.clone();
        let service: Arc<dyn RelationshipService> = Arc::new(RealRelationshipService::new(
            handles.repos.clone(),
            provisioner(handles.conversation_repo.clone()),
            Arc::new(LivePresenceNotifier::new(presence)),
            handles.tx_manager.clone(),
            config,
        ));
        Self {
            store,
            handles,
            hub,
            service,
        }
    }

    pub async fn user(&self, username: &str) -> UserId {
        let profile = UserProfile {
            user_id: fake_user_id(username),
            username: username.to_owned(),
            display_name: format!("{username} (display)"),
        };
        self.handles.seed_users(&[profile.clone()]).await.unwrap();
        profile.user_id
    }

    pub async fn relations(&self, user_id: UserId) -> UserRelations {
        self.service.user_relations(user_id).await.unwrap()
    }

    pub async fn befriend(&self, a: UserId, b: UserId) -> ConversationId {
        self.service.send_friend_request(a, b).await.unwrap();
        let outcome = self.service.accept_friend_request(b, a).await.unwrap();
        match outcome.state {
            RelationState::Friendship(FriendshipState::Friends { conversation_id }) => {
                conversation_id
            }
            other => panic!("unexpected state after accept: {other:?}"),
        }
    }

    /// Registers `user_id` as online through in-process channels.
    pub async fn connect(&self, user_id: UserId) -> LiveClient {
        let (s2c_tx, s2c_rx) = tokio::sync::mpsc::channel(64);
        let (c2s_tx, c2s_rx) = tokio::sync::mpsc::channel(64);
        self.hub
            .accept_connection(Box::new(s2c_tx), Box::new(c2s_rx), user_id)
            .await
            .unwrap();
        LiveClient {
            _to_server: c2s_tx,
            from_server: s2c_rx,
        }
    }
}

pub struct LiveClient {
    _to_server: Sender<ConnMessage>,
    from_server: Receiver<ConnMessage>,
}

impl LiveClient {
    pub async fn next_event(&mut self) -> serde_json::Value {
        let message = tokio::time::timeout(Duration::from_secs(1), self.from_server.recv())
            .await
            .expect("no event within 1s")
            .expect("connection closed");
        match message {
            ConnMessage::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

pub fn friendship(outcome: &RelationOutcome) -> FriendshipState {
    match outcome.state {
        RelationState::Friendship(state) => state,
        other => panic!("expected a friendship state, got {other:?}"),
    }
}

pub fn first_page() -> Pagination {
    Pagination::new(1, 20)
}
