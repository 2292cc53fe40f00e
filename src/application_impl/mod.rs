mod conversation_provisioner_impl;
mod presence_notifier_impl;
mod relationship_service_impl;
mod token_verifier_fake;
mod token_verifier_jwt;

pub use conversation_provisioner_impl::*;
pub use presence_notifier_impl::*;
pub use relationship_service_impl::*;
pub use token_verifier_fake::*;
pub use token_verifier_jwt::*;
