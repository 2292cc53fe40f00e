mod auth_service;
mod conversation_provisioner;
mod presence_notifier;
mod relationship_service;

pub use auth_service::*;
pub use conversation_provisioner::*;
pub use presence_notifier::*;
pub use relationship_service::*;
