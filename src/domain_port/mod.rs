// presence

mod presence;

pub use presence::*;

// repo

mod block_repo;
mod conversation_repo;
mod follow_repo;
mod friendship_repo;
mod user_repo;

mod repo_tx;

pub use block_repo::*;
pub use conversation_repo::*;
pub use follow_repo::*;
pub use friendship_repo::*;
pub use user_repo::*;

pub use repo_tx::*;
