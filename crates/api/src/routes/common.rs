use crate::models::ErrorResponse;
use axum::{http::StatusCode, response::Json as ResponseJson};
use inference_providers::CompletionError;
use services::{
    chat::ChatError, conversations::ConversationError, search::QuotaError,
    templates::TemplateError, usage::UsageError, InferenceProviderPool,
};

pub type ApiError = (StatusCode, ResponseJson<ErrorResponse>);

pub fn error_response(status: StatusCode, message: String, error_type: &str) -> ApiError {
    (
        status,
        ResponseJson(ErrorResponse::new(message, error_type.to_string())),
    )
}

pub fn map_chat_error(error: &ChatError) -> ApiError {
    let (status, error_type) = match error {
        ChatError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
        ChatError::Authentication(_) => (StatusCode::UNAUTHORIZED, "authentication_error"),
        ChatError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
        ChatError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found_error"),
        ChatError::QuotaExceeded(_) => (StatusCode::TOO_MANY_REQUESTS, "quota_exceeded"),
        ChatError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
        ChatError::StreamProcessing(_) | ChatError::Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };

    let message = match error {
        ChatError::Internal(_) => "Internal server error".to_string(),
        other => other.to_string(),
    };
    error_response(status, message, error_type)
}

pub fn map_conversation_error(error: &ConversationError) -> ApiError {
    match error {
        ConversationError::NotFound => error_response(
            StatusCode::NOT_FOUND,
            error.to_string(),
            "not_found_error",
        ),
        ConversationError::InvalidParams(_) => error_response(
            StatusCode::BAD_REQUEST,
            error.to_string(),
            "invalid_request_error",
        ),
        ConversationError::InternalError(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
            "internal_error",
        ),
    }
}

pub fn map_quota_error(error: &QuotaError) -> ApiError {
    match error {
        QuotaError::Exceeded { .. } => error_response(
            StatusCode::TOO_MANY_REQUESTS,
            error.to_string(),
            "quota_exceeded",
        ),
        QuotaError::Repository(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
            "internal_error",
        ),
    }
}

pub fn map_template_error(error: &TemplateError) -> ApiError {
    match error {
        TemplateError::NotFound => error_response(
            StatusCode::NOT_FOUND,
            error.to_string(),
            "not_found_error",
        ),
        TemplateError::InvalidParams(_) => error_response(
            StatusCode::BAD_REQUEST,
            error.to_string(),
            "invalid_request_error",
        ),
        TemplateError::InternalError(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
            "internal_error",
        ),
    }
}

pub fn map_usage_error(error: &UsageError) -> ApiError {
    match error {
        UsageError::InvalidParams(_) => error_response(
            StatusCode::BAD_REQUEST,
            error.to_string(),
            "invalid_request_error",
        ),
        UsageError::InternalError(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
            "internal_error",
        ),
    }
}

/// Upstream failures are reported without URLs or addresses
pub fn map_credits_error(error: &CompletionError) -> ApiError {
    match error {
        CompletionError::UnknownProvider(_) | CompletionError::Unsupported(_) => error_response(
            StatusCode::BAD_REQUEST,
            error.to_string(),
            "invalid_request_error",
        ),
        CompletionError::MissingCredential(provider) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{provider} API key not configured"),
            "configuration_error",
        ),
        CompletionError::HttpError { .. }
        | CompletionError::CompletionError(_)
        | CompletionError::InvalidResponse(_) => error_response(
            StatusCode::BAD_GATEWAY,
            InferenceProviderPool::sanitize_error_message(&error.to_string()),
            "upstream_error",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_statuses() {
        let cases = [
            (ChatError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ChatError::NotFound("Chat not found".into()), StatusCode::NOT_FOUND),
            (ChatError::QuotaExceeded("limit".into()), StatusCode::TOO_MANY_REQUESTS),
            (
                ChatError::Upstream {
                    status: 401,
                    body: "bad key".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                ChatError::Configuration("together API key not configured".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(map_chat_error(&error).0, expected, "{error}");
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let (_, ResponseJson(body)) =
            map_chat_error(&ChatError::Internal("connection pool exhausted".into()));
        assert_eq!(body.error, "Internal server error");
    }

    #[test]
    fn test_credits_error_statuses() {
        let (status, _) = map_credits_error(&CompletionError::Unsupported("together".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, ResponseJson(body)) = map_credits_error(&CompletionError::HttpError {
            status_code: 500,
            message: "error sending request for url (https://openrouter.ai/api/v1/credits)".into(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.error.contains("openrouter.ai"));
    }
}
