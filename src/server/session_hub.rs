use crate::domain_model::*;
use crate::domain_port::*;
use crate::server::*;
use anyhow::anyhow;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const MAILBOX_CAP: usize = 256;
const CONTROL_CAP: usize = 16;

pub struct ClientRecord {
    pub user_id: UserId,
    pub connection_id: u64,
    pub mailbox: Sender<ConnMessage>,
    pub actor_handle: Mutex<Option<JoinHandle<()>>>,
    pub cancellation_token: CancellationToken,
}

/// Presence registry: one live connection per user, newest wins.
pub struct SessionHub {
    online_users: Arc<DashMap<UserId, ClientRecord>>,
    next_connection_id: AtomicU64,
    mailbox_cap: usize,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    pub fn new() -> Self {
        Self::with_mailbox_cap(MAILBOX_CAP)
    }

    pub fn with_mailbox_cap(mailbox_cap: usize) -> Self {
        Self {
            online_users: Arc::new(DashMap::new()),
            next_connection_id: AtomicU64::new(1),
            mailbox_cap,
        }
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.online_users.contains_key(&user_id)
    }

    pub fn online_count(&self) -> usize {
        self.online_users.len()
    }

    pub async fn shutdown(&self) {
        tracing::info!("SessionHub shutting down...");

        for entry in self.online_users.iter() {
            entry.cancellation_token.cancel();
        }

        let mut handles = Vec::new();
        for entry in self.online_users.iter() {
            if let Ok(mut lock) = entry.actor_handle.lock() {
                if let Some(handle) = lock.take() {
                    handles.push(handle);
                }
            }
        }

        for handle in handles {
            let _ = handle.await;
        }

        tracing::info!("All SessionHub actors shut down.");
    }
}

// region connection acceptor

#[async_trait::async_trait]
impl ConnectionAcceptor for SessionHub {
    async fn accept_connection(
        &self,
        s2c_channel: Box<dyn ConnSender>,
        c2s_channel: Box<dyn ConnReceiver>,
        user_id: UserId,
    ) -> anyhow::Result<()> {
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        let actor_cancel = CancellationToken::new();

        let (control_tx, control_rx) = tokio::sync::mpsc::channel(CONTROL_CAP);
        let (mailbox_tx, mailbox_rx) = tokio::sync::mpsc::channel(self.mailbox_cap);

        let notify = Arc::new(Notify::new());
        let actor_handle = tokio::spawn(client_actor(
            ActorChannels {
                s2c_channel,
                c2s_channel,
                control_tx,
                control_rx,
                mailbox_rx,
            },
            user_id,
            connection_id,
            actor_cancel.clone(),
            notify.clone(),
            self.online_users.clone(),
        ));

        let record = ClientRecord {
            user_id,
            connection_id,
            mailbox: mailbox_tx,
            actor_handle: Mutex::new(Some(actor_handle)),
            cancellation_token: actor_cancel,
        };
        if let Some(previous) = self.online_users.insert(user_id, record) {
            tracing::info!(
                %user_id,
                replaced = previous.connection_id,
                "newer connection replaces the previous one"
            );
            previous.cancellation_token.cancel();
        }
        notify.notify_one();

        Ok(())
    }
}

struct ActorChannels {
    s2c_channel: Box<dyn ConnSender>,
    c2s_channel: Box<dyn ConnReceiver>,
    control_tx: Sender<ConnMessage>,
    control_rx: Receiver<ConnMessage>,
    mailbox_rx: Receiver<ConnMessage>,
}

async fn client_actor(
    channels: ActorChannels,
    user_id: UserId,
    connection_id: u64,
    actor_cancel: CancellationToken,
    notify: Arc<Notify>,
    online_users: Arc<DashMap<UserId, ClientRecord>>,
) {
    // the record must be visible before the connection can close
    notify.notified().await;
    tracing::info!("ClientActor [{}#{}] starting", user_id, connection_id);

    let ActorChannels {
        s2c_channel,
        c2s_channel,
        control_tx,
        control_rx,
        mailbox_rx,
    } = channels;

    let sender_handle = tokio::spawn(outbound_sender(
        s2c_channel,
        control_rx,
        mailbox_rx,
        actor_cancel.clone(),
    ));
    let receiver_handle = tokio::spawn(inbound_receiver(
        user_id,
        c2s_channel,
        control_tx,
        actor_cancel.clone(),
    ));

    tokio::select! {
        res = sender_handle => {
            tracing::debug!("Sender task ended first ({}): {:?}", user_id, res);
        },
        res = receiver_handle => {
            tracing::debug!("Receiver task ended first ({}): {:?}", user_id, res);
        }
    };
    actor_cancel.cancel();

    // a replacement connection owns the slot now
    online_users.remove_if(&user_id, |_, record| record.connection_id == connection_id);
    tracing::debug!("online_users: {}", online_users.len());
}

async fn outbound_sender(
    mut s2c_channel: Box<dyn ConnSender>,
    mut control_rx: Receiver<ConnMessage>,
    mut mailbox_rx: Receiver<ConnMessage>,
    actor_cancel: CancellationToken,
) {
    while let Some(msg) = tokio::select! {
        biased;
        _ = actor_cancel.cancelled() => None,
        m = control_rx.recv() => m,
        m = mailbox_rx.recv() => m,
    } {
        tracing::trace!("outbound_sender: {:?}", msg);
        if s2c_channel.send(msg).await.is_err() {
            tracing::trace!("outbound_sender shutting down");
            actor_cancel.cancel();
            break;
        }
    }
}

async fn inbound_receiver(
    user_id: UserId,
    mut c2s_channel: Box<dyn ConnReceiver>,
    control_tx: Sender<ConnMessage>,
    actor_cancel: CancellationToken,
) {
    loop {
        let conn_msg = tokio::select! {
            biased;

            _ = actor_cancel.cancelled() => {
                tracing::info!("ClientActor [{}] shutdown by cancel", user_id);
                break;
            },

            maybe_message = c2s_channel.next() => match maybe_message {
                Some(Ok(m)) => m,
                // closed, or a low level error
                _ => break,
            },
        };

        match conn_msg {
            ConnMessage::Ping => {
                if control_tx.send(ConnMessage::Pong).await.is_err() {
                    break;
                }
            }
            ConnMessage::Close => break,
            ConnMessage::Pong => {}
            // the live channel is push-only
            ConnMessage::Text(_) | ConnMessage::Binary(_) => {
                tracing::debug!("ignoring client frame from [{}]", user_id);
            }
        }
    }

    actor_cancel.cancel();
    tracing::info!("ClientActor [{}] shutting down", user_id);
}

// endregion

// region presence lookup

/// Cheap handle onto a connection's outbound mailbox.
struct MailboxHandle {
    mailbox: Sender<ConnMessage>,
}

impl LiveConnection for MailboxHandle {
    fn push(&self, payload: String) -> anyhow::Result<()> {
        match self.mailbox.try_send(ConnMessage::Text(payload)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(..)) => Err(anyhow!("mailbox full")),
            Err(TrySendError::Closed(..)) => Err(anyhow!("connection closed")),
        }
    }
}

impl PresenceLookup for SessionHub {
    fn get_connection(&self, user_id: UserId) -> Option<Arc<dyn LiveConnection>> {
        self.online_users.get(&user_id).map(|record| {
            Arc::new(MailboxHandle {
                mailbox: record.mailbox.clone(),
            }) as Arc<dyn LiveConnection>
        })
    }
}

// endregion

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct TestClient {
        to_server: Sender<ConnMessage>,
        from_server: Receiver<ConnMessage>,
    }

    async fn connect(hub: &SessionHub, user_id: UserId) -> TestClient {
        let (s2c_tx, s2c_rx) = tokio::sync::mpsc::channel(64);
        let (c2s_tx, c2s_rx) = tokio::sync::mpsc::channel(64);
        hub.accept_connection(Box::new(s2c_tx), Box::new(c2s_rx), user_id)
            .await
            .unwrap();
        TestClient {
            to_server: c2s_tx,
            from_server: s2c_rx,
        }
    }

    async fn recv(client: &mut TestClient) -> Option<ConnMessage> {
        tokio::time::timeout(Duration::from_secs(1), client.from_server.recv())
            .await
            .ok()
            .flatten()
    }

    async fn wait_until(cond: impl Fn() -> bool) {
        for _ in 0..100 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn pushed_payload_reaches_the_socket() {
        let hub = SessionHub::new();
        let user = UserId::new_v4();
        let mut client = connect(&hub, user).await;

        let conn = hub.get_connection(user).unwrap();
        conn.push("hello".to_owned()).unwrap();
        assert_eq!(recv(&mut client).await, Some(ConnMessage::Text("hello".into())));
        assert!(hub.get_connection(UserId::new_v4()).is_none());
    }

    #[tokio::test]
    async fn ping_is_answered() {
        let hub = SessionHub::new();
        let mut client = connect(&hub, UserId::new_v4()).await;
        client.to_server.send(ConnMessage::Ping).await.unwrap();
        assert_eq!(recv(&mut client).await, Some(ConnMessage::Pong));
    }

    #[tokio::test]
    async fn closing_removes_presence() {
        let hub = SessionHub::new();
        let user = UserId::new_v4();
        let client = connect(&hub, user).await;
        assert!(hub.is_online(user));

        client.to_server.send(ConnMessage::Close).await.unwrap();
        wait_until(|| !hub.is_online(user)).await;
    }

    #[tokio::test]
    async fn newer_connection_replaces_older() {
        let hub = SessionHub::new();
        let user = UserId::new_v4();
        let mut first = connect(&hub, user).await;
        let mut second = connect(&hub, user).await;

        // the first actor exits without evicting the second record
        assert_eq!(recv(&mut first).await, None);
        assert!(hub.is_online(user));
        assert_eq!(hub.online_count(), 1);

        hub.get_connection(user)
            .unwrap()
            .push("to-second".to_owned())
            .unwrap();
        assert_eq!(
            recv(&mut second).await,
            Some(ConnMessage::Text("to-second".into()))
        );
    }

    #[tokio::test]
    async fn full_mailbox_rejects_push() {
        let hub = SessionHub::with_mailbox_cap(1);
        let user = UserId::new_v4();
        // keep the socket side unread so the mailbox fills up
        let (s2c_tx, _s2c_rx) = tokio::sync::mpsc::channel(1);
        let (_c2s_tx, c2s_rx) = tokio::sync::mpsc::channel::<ConnMessage>(1);
        hub.accept_connection(Box::new(s2c_tx), Box::new(c2s_rx), user)
            .await
            .unwrap();

        let conn = hub.get_connection(user).unwrap();
        let rejected = (0..16).any(|i| conn.push(format!("m{i}")).is_err());
        assert!(rejected);
    }

    #[tokio::test]
    async fn shutdown_stops_every_actor() {
        let hub = SessionHub::new();
        let mut a = connect(&hub, UserId::new_v4()).await;
        let mut b = connect(&hub, UserId::new_v4()).await;

        tokio::time::timeout(Duration::from_secs(1), hub.shutdown())
            .await
            .unwrap();
        assert_eq!(recv(&mut a).await, None);
        assert_eq!(recv(&mut b).await, None);
    }
}
