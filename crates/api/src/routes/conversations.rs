use crate::{
    middleware::AuthenticatedUser,
    models::*,
    routes::{
        api::AppState,
        common::{error_response, map_conversation_error, ApiError},
    },
};
use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
};
use services::chat::ChatId;
use tracing::debug;

fn parse_chat_id(id: &str) -> Result<ChatId, ApiError> {
    id.parse::<ChatId>().map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            e.to_string(),
            "invalid_request_error",
        )
    })
}

/// List the caller's conversations, most recent first
#[utoipa::path(
    get,
    path = "/api/conversations",
    responses(
        (status = 200, description = "Conversations", body = ConversationList),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Conversations"
)]
pub async fn list_conversations(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ResponseJson<ConversationList>, ApiError> {
    debug!("List conversations for user {}", user.0);

    let chats = app_state
        .conversation_service
        .list_conversations(&user.0)
        .await
        .map_err(|e| map_conversation_error(&e))?;

    Ok(ResponseJson(ConversationList {
        data: chats.into_iter().map(Into::into).collect(),
    }))
}

/// Get a conversation with its messages
#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}",
    params(("conversation_id" = String, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation", body = ConversationDetail),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Conversations"
)]
pub async fn get_conversation(
    Path(conversation_id): Path<String>,
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ResponseJson<ConversationDetail>, ApiError> {
    debug!("Get conversation {} for user {}", conversation_id, user.0);
    let id = parse_chat_id(&conversation_id)?;

    let conversation = app_state
        .conversation_service
        .get_conversation(id, &user.0)
        .await
        .map_err(|e| map_conversation_error(&e))?;

    Ok(ResponseJson(conversation.into()))
}

/// Rename a conversation
#[utoipa::path(
    patch,
    path = "/api/conversations/{conversation_id}",
    params(("conversation_id" = String, Path, description = "Conversation ID")),
    request_body = RenameConversationRequest,
    responses(
        (status = 200, description = "Renamed conversation", body = ConversationObject),
        (status = 400, description = "Invalid title", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Conversations"
)]
pub async fn rename_conversation(
    Path(conversation_id): Path<String>,
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<RenameConversationRequest>,
) -> Result<ResponseJson<ConversationObject>, ApiError> {
    debug!("Rename conversation {} for user {}", conversation_id, user.0);
    let id = parse_chat_id(&conversation_id)?;

    let chat = app_state
        .conversation_service
        .rename_conversation(id, &user.0, &request.title)
        .await
        .map_err(|e| map_conversation_error(&e))?;

    Ok(ResponseJson(chat.into()))
}

/// Delete a conversation and its messages
#[utoipa::path(
    delete,
    path = "/api/conversations/{conversation_id}",
    params(("conversation_id" = String, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation deleted", body = ConversationDeleteResult),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Conversations"
)]
pub async fn delete_conversation(
    Path(conversation_id): Path<String>,
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ResponseJson<ConversationDeleteResult>, ApiError> {
    debug!("Delete conversation {} for user {}", conversation_id, user.0);
    let id = parse_chat_id(&conversation_id)?;

    app_state
        .conversation_service
        .delete_conversation(id, &user.0)
        .await
        .map_err(|e| map_conversation_error(&e))?;

    Ok(ResponseJson(ConversationDeleteResult {
        id: id.to_string(),
        deleted: true,
    }))
}
