use inference_providers::CompletionError;

use crate::search::QuotaError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Unauthorized: {0}")]
    Authentication(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    QuotaExceeded(String),
    /// The provider rejected the request before streaming began
    #[error("Upstream error {status}: {body}")]
    Upstream { status: u16, body: String },
    /// Only ever reported in-band
    #[error("Stream processing error: {0}")]
    StreamProcessing(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CompletionError> for ChatError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::MissingCredential(provider) => {
                ChatError::Configuration(format!("{provider} API key not configured"))
            }
            CompletionError::UnknownProvider(name) => {
                ChatError::Validation(format!("Unknown provider: {name}"))
            }
            CompletionError::HttpError {
                status_code,
                message,
            } => ChatError::Upstream {
                status: status_code,
                body: message,
            },
            CompletionError::CompletionError(message) => ChatError::Upstream {
                status: 502,
                body: message,
            },
            CompletionError::InvalidResponse(message) => ChatError::StreamProcessing(message),
            CompletionError::Unsupported(provider) => {
                ChatError::Validation(format!("Operation not supported by {provider}"))
            }
        }
    }
}

impl From<QuotaError> for ChatError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::Exceeded { .. } => ChatError::QuotaExceeded(err.to_string()),
            QuotaError::Repository(message) => ChatError::Internal(message),
        }
    }
}
