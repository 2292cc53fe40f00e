use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::server::*;
use crate::settings::Settings;
use nanoid::nanoid;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Storage-side handles, built for whichever backend the settings select.
pub struct StoreHandles {
    pub repos: RelationshipRepos,
    pub conversation_repo: Arc<dyn ConversationRepo>,
    pub tx_manager: Arc<dyn TxManager>,
    pool: Option<Pool<MySql>>,
}

impl StoreHandles {
    pub fn memory(store: MemoryStore) -> Self {
        Self {
            repos: RelationshipRepos {
                user: Arc::new(MemoryUserRepo::new(store.clone())),
                friendship: Arc::new(MemoryFriendshipRepo::new(store.clone())),
                follow: Arc::new(MemoryFollowRepo::new(store.clone())),
                block: Arc::new(MemoryBlockRepo::new(store.clone())),
            },
            conversation_repo: Arc::new(MemoryConversationRepo::new(store.clone())),
            tx_manager: Arc::new(MemoryTxManager::new(store)),
            pool: None,
        }
    }

    pub fn mysql(pool: Pool<MySql>) -> Self {
        Self {
            repos: RelationshipRepos {
                user: Arc::new(MySqlUserRepo::new(pool.clone())),
                friendship: Arc::new(MySqlFriendshipRepo::new(pool.clone())),
                follow: Arc::new(MySqlFollowRepo::new(pool.clone())),
                block: Arc::new(MySqlBlockRepo::new(pool.clone())),
            },
            conversation_repo: Arc::new(MySqlConversationRepo::new(pool.clone())),
            tx_manager: Arc::new(MySqlTxManager::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Creates any missing user among `profiles`, all in one transaction.
    pub async fn seed_users(&self, profiles: &[UserProfile]) -> anyhow::Result<()> {
        let mut tx = self.tx_manager.begin().await?;
        for profile in profiles {
            if !self.repos.user.exists_in_tx(&mut *tx, profile.user_id).await? {
                self.repos.user.create_in_tx(&mut *tx, profile).await?;
            }
        }
        tx.commit().await
    }
}

pub struct Server {
    pub run_id: String,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub relationship_service: Arc<dyn RelationshipService>,
    pub connection_acceptor: Arc<dyn ConnectionAcceptor>,
    session_hub: Arc<SessionHub>,
    store: StoreHandles,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        let store = match settings.store.backend.as_str() {
            "memory" => StoreHandles::memory(MemoryStore::new()),
            "mysql" => {
                let dsn = settings
                    .store
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.mysql_dsn is required for mysql"))?;
                let pool = Pool::<MySql>::connect(dsn).await?;
                if settings.store.run_migrations {
                    migrate(&pool).await?;
                    info!("migrations applied");
                }
                StoreHandles::mysql(pool)
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let seeds: Vec<UserProfile> = settings
            .store
            .seed_users
            .iter()
            .map(|username| UserProfile {
                user_id: fake_user_id(username),
                username: username.clone(),
                display_name: username.clone(),
            })
            .collect();
        if !seeds.is_empty() {
            store.seed_users(&seeds).await?;
            info!(count = seeds.len(), "seed users ensured");
        }

        let token_verifier: Arc<dyn TokenVerifier> = match settings.auth.backend.as_str() {
            "fake" => Arc::new(FakeTokenVerifier::new()),
            "jwt" => {
                let key = std::env::var(&settings.auth.signing_key_env)
                    .ok()
                    .or_else(|| settings.auth.signing_key.clone())
                    .ok_or_else(|| anyhow::anyhow!("no JWT signing key configured"))?
                    .into_bytes();
                Arc::new(JwtHs256Verifier::new(JwtConfig {
                    issuer: settings.auth.issuer.clone(),
                    audience: settings.auth.audience.clone(),
                    signing_key: key,
                }))
            }
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        let session_hub = Arc::new(SessionHub::new());
        let connection_acceptor: Arc<dyn ConnectionAcceptor> = session_hub.clone();
        let presence: Arc<dyn PresenceLookup> = session_hub.clone();

        let relationship_service: Arc<dyn RelationshipService> =
            Arc::new(RealRelationshipService::new(
                store.repos.clone(),
                Arc::new(RealConversationProvisioner::new(
                    store.conversation_repo.clone(),
                )),
                Arc::new(LivePresenceNotifier::new(presence)),
                store.tx_manager.clone(),
                RelationshipConfig {
                    tx_timeout: Duration::from_millis(settings.relationship.tx_timeout_ms),
                    max_page_size: settings.relationship.max_page_size,
                },
            ));

        info!(%run_id, store = %settings.store.backend, "server started");

        Ok(Self {
            run_id,
            token_verifier,
            relationship_service,
            connection_acceptor,
            session_hub,
            store,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.session_hub.shutdown().await;
        if let Some(pool) = &self.store.pool {
            pool.close().await;
        }
    }
}
