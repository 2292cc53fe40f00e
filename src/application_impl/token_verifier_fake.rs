use crate::application_port::*;
use crate::domain_model::UserId;

const FAKE_TOKEN_PREFIX: &str = "fake-access-token:";

#[derive(Debug, Default)]
pub struct FakeTokenVerifier;

impl FakeTokenVerifier {
    pub fn new() -> Self {
        Self
    }
}

// Development only: `fake-access-token:<username>` authenticates as the
// seeded user of that name.
#[async_trait::async_trait]
impl TokenVerifier for FakeTokenVerifier {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        match token.strip_prefix(FAKE_TOKEN_PREFIX) {
            Some(username) if !username.is_empty() => Ok(fake_user_id(username)),
            _ => Err(AuthError::TokenInvalid),
        }
    }
}

/// Stable id for a seeded username, shared by the seeder and the fake verifier.
pub fn fake_user_id(username: &str) -> UserId {
    UserId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        username.as_bytes(),
    ))
}

pub fn fake_token(username: &str) -> String {
    format!("{FAKE_TOKEN_PREFIX}{username}")
}
