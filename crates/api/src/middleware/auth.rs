use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use services::auth::{AuthError, AuthServiceTrait, UserId};
use std::sync::Arc;
use tracing::debug;

use crate::models::ErrorResponse;

/// Authenticated user information passed to route handlers
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub UserId);

#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<dyn AuthServiceTrait>,
}

impl AuthState {
    pub fn new(auth_service: Arc<dyn AuthServiceTrait>) -> Self {
        Self { auth_service }
    }
}

fn unauthorized(message: &str) -> (StatusCode, axum::Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(ErrorResponse::new(
            message.to_string(),
            "authentication_error".to_string(),
        )),
    )
}

/// Resolve `Authorization: Bearer <token>` to a user and attach it to the request
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, axum::Json<ErrorResponse>)> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let Some(auth_value) = auth_header else {
        return Err(unauthorized("Missing authorization header"));
    };
    let Some(token) = auth_value.strip_prefix("Bearer ") else {
        debug!("Authorization header does not start with 'Bearer '");
        return Err(unauthorized("Invalid authorization header format"));
    };

    match state.auth_service.authenticate(token).await {
        Ok(user_id) => {
            debug!("Authenticated user: {}", user_id);
            request
                .extensions_mut()
                .insert(AuthenticatedUser(user_id));
            Ok(next.run(request).await)
        }
        Err(AuthError::MissingToken) => Err(unauthorized("Missing bearer token")),
        Err(AuthError::AuthFailed(reason)) => {
            debug!("Authentication failed: {}", reason);
            Err(unauthorized("Invalid or unknown token"))
        }
    }
}
