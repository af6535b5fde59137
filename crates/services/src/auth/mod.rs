//! Bearer-token authentication against a static token table
//!
//! Sessions and user accounts live outside this service; the gateway only
//! needs to know which user a token belongs to.

pub mod ports;

pub use ports::{AuthError, AuthServiceTrait, UserId};

use async_trait::async_trait;
use std::collections::HashMap;

pub struct StaticTokenAuthService {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuthService {
    /// `tokens` maps token to user id
    pub fn new(tokens: HashMap<String, String>) -> Self {
        if tokens.is_empty() {
            tracing::warn!("No API tokens configured, every request will be rejected");
        }
        Self { tokens }
    }
}

#[async_trait]
impl AuthServiceTrait for StaticTokenAuthService {
    async fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        self.tokens
            .get(token)
            .map(|user| UserId(user.clone()))
            .ok_or_else(|| AuthError::AuthFailed("Unknown token".to_string()))
    }
}
