use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{error::Result, middleware::AuthUser, state::AppState};

use super::message_dto::{
    CreateConversationRequest, HasMessagesResponse, MessagesQuery, SendMessageRequest,
};

/// List the caller's active conversations
#[utoipa::path(
    get,
    path = "/api/messages/conversations",
    tag = "messages",
    responses(
        (status = 200, description = "Conversations newest-activity first"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let conversations = state.message_service.list_conversations(user_id).await?;

    Ok((StatusCode::OK, Json(conversations)))
}

/// Get or create the conversation for an item
#[utoipa::path(
    post,
    path = "/api/messages/conversations",
    tag = "messages",
    request_body = CreateConversationRequest,
    responses(
        (status = 200, description = "Existing or newly created conversation"),
        (status = 400, description = "Cannot message yourself"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse> {
    let conversation = state
        .message_service
        .get_or_create_conversation(user_id, payload.item_id)
        .await?;

    Ok((StatusCode::OK, Json(conversation)))
}

// ... (list_messages)
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse> {
    let messages = state
        .message_service
        .list_messages(conversation_id, user_id, query.limit, query.before)
        .await?;

    Ok((StatusCode::OK, Json(messages)))
}

// ... (send_message)
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    let message = state
        .message_service
        .send_message(conversation_id, user_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

// ... (mark_read)
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .message_service
        .mark_read(conversation_id, user_id)
        .await?;

    Ok(Json(json!({ "success": true })))
}

// ... (archive_conversation)
pub async fn archive_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .message_service
        .archive(conversation_id, user_id)
        .await?;

    Ok(Json(json!({ "success": true })))
}

// ... (has_messages)
pub async fn has_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let has_messages = state
        .message_service
        .has_messages(conversation_id, user_id)
        .await?;

    Ok((StatusCode::OK, Json(HasMessagesResponse { has_messages })))
}

// ... (list_templates)
pub async fn list_templates(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let templates = state.message_service.list_templates().await?;

    Ok((StatusCode::OK, Json(templates)))
}
