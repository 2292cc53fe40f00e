use super::repo_tx_memory::{MemoryStore, downcast};
use super::state::UserDocument;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryUserRepo {
    store: MemoryStore,
}

impl MemoryUserRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryUserRepo { store }
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        profile: &UserProfile,
    ) -> Result<(), RelationError> {
        let state = downcast(tx)?.state_mut();
        if state.users.contains_key(&profile.user_id)
            || state
                .users
                .values()
                .any(|doc| doc.profile.username == profile.username)
        {
            return Err(RelationError::Store(format!(
                "duplicate user: {}",
                profile.username
            )));
        }
        state.users.insert(
            profile.user_id,
            UserDocument {
                profile: profile.clone(),
                relations: UserRelations::default(),
            },
        );
        Ok(())
    }

    async fn exists_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<bool, RelationError> {
        Ok(downcast(tx)?.state().users.contains_key(&user_id))
    }

    async fn get_profile_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Option<UserProfile>, RelationError> {
        Ok(downcast(tx)?
            .state()
            .users
            .get(&user_id)
            .map(|doc| doc.profile.clone()))
    }

    async fn exists(&self, user_id: UserId) -> Result<bool, RelationError> {
        Ok(self.store.read().await.users.contains_key(&user_id))
    }
}
