use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::message_dto::{
    ConversationResponse, MessageResponse, SendMessageRequest, UserSummary,
};
use super::message_models::{Conversation, MessageTemplate};
use super::message_repository::MessageRepository;
use crate::error::{AppError, Result};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Clone)]
pub struct MessageService {
    message_repo: MessageRepository,
}

impl MessageService {
    pub fn new(message_repo: MessageRepository) -> Self {
        Self { message_repo }
    }

    /// Resolve the thread between the caller and an item's seller,
    /// creating it on first contact.
    pub async fn get_or_create_conversation(
        &self,
        buyer_id: Uuid,
        item_id: Uuid,
    ) -> Result<ConversationResponse> {
        let seller_id = self
            .message_repo
            .find_item_seller(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

        if seller_id == buyer_id {
            return Err(AppError::BadRequest("Cannot message yourself".to_string()));
        }

        let row = self
            .message_repo
            .get_or_create(item_id, buyer_id, seller_id)
            .await?;

        Ok(row.into())
    }

    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationResponse>> {
        let rows = self.message_repo.list_for_user(user_id).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        request: SendMessageRequest,
    ) -> Result<MessageResponse> {
        let conversation = self.require_participant(conversation_id, sender_id).await?;

        // Archived threads are hidden from both parties' lists; accepting
        // writes would grow unread counters nobody can see.
        if conversation.status == "archived" {
            return Err(AppError::BadRequest(
                "Conversation is archived".to_string(),
            ));
        }

        if request.message_type != "text" && request.message_type != "location" {
            return Err(AppError::Validation(
                "messageType must be text or location".to_string(),
            ));
        }

        let content = resolve_content(&request)?;

        let recipient_id = conversation
            .counterpart_of(sender_id)
            .ok_or_else(|| AppError::Forbidden("Not authorized".to_string()))?;

        let location_data = match request.location_data {
            Some(ref data) => Some(
                serde_json::to_value(data).map_err(|_| AppError::InternalError)?,
            ),
            None => None,
        };

        let message = self
            .message_repo
            .append_message(
                conversation_id,
                sender_id,
                recipient_id,
                &content,
                &request.message_type,
                location_data,
            )
            .await?;

        let (first_name, last_name, email, photo) = self
            .message_repo
            .find_user_summary_fields(sender_id)
            .await?;
        let sender = UserSummary::new(sender_id, first_name, last_name, email, photo);

        Ok(MessageResponse::from_message(message, sender))
    }

    /// Chronological page of messages. Fetched newest-first so the latest
    /// N are cheap, then reversed so the caller always reads oldest first.
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        caller_id: Uuid,
        limit: Option<i64>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<MessageResponse>> {
        self.require_participant(conversation_id, caller_id).await?;

        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let mut rows = self
            .message_repo
            .list_messages(conversation_id, limit, before)
            .await?;
        rows.reverse();

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<()> {
        self.require_participant(conversation_id, reader_id).await?;
        self.message_repo.mark_read(conversation_id, reader_id).await
    }

    pub async fn has_messages(&self, conversation_id: Uuid, caller_id: Uuid) -> Result<bool> {
        self.require_participant(conversation_id, caller_id).await?;
        self.message_repo.has_messages(conversation_id).await
    }

    pub async fn archive(&self, conversation_id: Uuid, caller_id: Uuid) -> Result<()> {
        self.require_participant(conversation_id, caller_id).await?;
        self.message_repo.archive(conversation_id).await
    }

    pub async fn list_templates(&self) -> Result<Vec<MessageTemplate>> {
        self.message_repo.list_templates().await
    }

    async fn require_participant(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Conversation> {
        self.message_repo
            .find_for_participant(conversation_id, user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Not authorized".to_string()))
    }
}

/// Text messages must carry content; location shares fall back to a
/// placeholder when no caption was typed.
fn resolve_content(request: &SendMessageRequest) -> Result<String> {
    let trimmed = request
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    match (trimmed, request.message_type.as_str()) {
        (Some(content), _) => Ok(content.to_string()),
        (None, "location") => Ok("Shared location".to_string()),
        (None, _) => Err(AppError::Validation(
            "Message content is required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::message_models::LocationData;

    fn request(content: Option<&str>, message_type: &str) -> SendMessageRequest {
        SendMessageRequest {
            content: content.map(String::from),
            message_type: message_type.to_string(),
            location_data: None,
        }
    }

    #[test]
    fn test_text_message_requires_content() {
        assert!(resolve_content(&request(None, "text")).is_err());
        assert!(resolve_content(&request(Some("   "), "text")).is_err());
        assert_eq!(
            resolve_content(&request(Some("Is this available?"), "text")).unwrap(),
            "Is this available?"
        );
    }

    #[test]
    fn test_location_message_defaults_content() {
        assert_eq!(
            resolve_content(&request(None, "location")).unwrap(),
            "Shared location"
        );
    }

    #[test]
    fn test_location_caption_is_kept() {
        let mut req = request(Some("Meet here"), "location");
        req.location_data = Some(LocationData {
            latitude: 40.7,
            longitude: -74.0,
            accuracy: None,
            is_live: false,
            timestamp: None,
        });
        assert_eq!(resolve_content(&req).unwrap(), "Meet here");
    }
}
