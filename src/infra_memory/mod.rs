//! Document-shaped backend: every user record embeds its relationship lists,
//! and a transaction works on a private copy of the whole state.

mod block_repo_memory;
mod conversation_repo_memory;
mod follow_repo_memory;
mod friendship_repo_memory;
mod user_repo_memory;

pub use block_repo_memory::*;
pub use conversation_repo_memory::*;
pub use follow_repo_memory::*;
pub use friendship_repo_memory::*;
pub use user_repo_memory::*;

mod repo_tx_memory;

pub use repo_tx_memory::*;

mod state;

pub use state::{MemoryState, UserDocument};
