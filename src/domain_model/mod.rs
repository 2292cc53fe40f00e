mod conversation;
mod event;
mod friend;
mod relationship;
mod unit;
mod user;

pub use conversation::*;
pub use event::*;
pub use friend::*;
pub use relationship::*;
pub use unit::*;
pub use user::*;
