use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// Domain ID types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Authentication failed: {0}")]
    AuthFailed(String),
}

#[async_trait]
pub trait AuthServiceTrait: Send + Sync {
    /// Resolve a bearer token to the user it was issued to
    async fn authenticate(&self, token: &str) -> Result<UserId, AuthError>;
}
