use crate::{
    middleware::AuthenticatedUser,
    models::{ChatRequestBody, ErrorResponse},
    routes::{api::AppState, common::map_chat_error},
};
use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json as ResponseJson, Response,
    },
};
use futures::stream::StreamExt;
use std::{convert::Infallible, time::Duration};
use tracing::debug;

/// Stream one chat turn
///
/// Responds with `text/event-stream`. Every event is a single `data:` line
/// holding one of `{conversationId}`, `{sources, searchUsageRemaining?}`,
/// `{reasoning}`, `{content}`, `{error}` or `{done: true}`. Errors detected
/// before streaming begins are returned as a JSON error body instead.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequestBody,
    responses(
        (status = 200, description = "Server-sent event stream", body = String, content_type = "text/event-stream"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
        (status = 429, description = "Monthly search limit reached", body = ErrorResponse),
        (status = 502, description = "Provider rejected the request", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Chat"
)]
pub async fn chat_stream(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<ChatRequestBody>,
) -> Response {
    debug!("Chat request from user: {}", user.0);

    if let Err(error) = request.validate() {
        return (
            StatusCode::BAD_REQUEST,
            ResponseJson(ErrorResponse::new(
                error,
                "invalid_request_error".to_string(),
            )),
        )
            .into_response();
    }

    let service_request = match request.into_service_request(user.0) {
        Ok(service_request) => service_request,
        Err(error) => return map_chat_error(&error).into_response(),
    };

    match app_state.chat_service.stream_chat(service_request).await {
        Ok(stream) => {
            let sse_stream = stream.map(|event| {
                Ok::<_, Infallible>(
                    Event::default().data(serde_json::to_string(&event).unwrap_or_default()),
                )
            });

            Sse::new(sse_stream)
                .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
                .into_response()
        }
        Err(error) => {
            tracing::warn!(error = %error, "Chat request rejected");
            map_chat_error(&error).into_response()
        }
    }
}
