use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::message_models::{LocationData, Message};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    #[serde(rename = "itemId")]
    pub item_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: Option<String>,
    #[serde(rename = "messageType", default = "default_message_type")]
    pub message_type: String,
    #[serde(rename = "locationData")]
    pub location_data: Option<LocationData>,
}

fn default_message_type() -> String {
    "text".to_string()
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
    /// Exclusive cursor: only messages created strictly before this
    /// timestamp are returned.
    pub before: Option<DateTime<Utc>>,
}

/// Display fields of the counterpart (or sender), shaped for the client.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub full_name: String,
    pub profile_photo: Option<String>,
}

impl UserSummary {
    pub fn new(
        id: Uuid,
        first_name: String,
        last_name: String,
        email: String,
        profile_photo: Option<String>,
    ) -> Self {
        let full_name = format!("{} {}", first_name, last_name);
        Self {
            id,
            first_name,
            last_name,
            email,
            full_name,
            profile_photo,
        }
    }
}

/// Conversation row joined with its item and the caller's counterpart,
/// with the unread counter already resolved to the caller's side.
#[derive(Debug, FromRow)]
pub struct ConversationRow {
    pub id: Uuid,
    pub item_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub status: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_preview: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item_title: Option<String>,
    pub item_price: Option<f64>,
    pub item_photo: Option<String>,
    pub item_status: Option<String>,
    pub unread_count: i32,
    pub other_user_id: Uuid,
    pub other_user_first_name: String,
    pub other_user_last_name: String,
    pub other_user_email: String,
    pub other_user_profile_photo: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub status: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_preview: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item_title: Option<String>,
    pub item_price: Option<f64>,
    pub item_photo: Option<String>,
    pub item_status: Option<String>,
    pub unread_count: i32,
    pub other_user: UserSummary,
}

impl From<ConversationRow> for ConversationResponse {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: row.id,
            item_id: row.item_id,
            buyer_id: row.buyer_id,
            seller_id: row.seller_id,
            status: row.status,
            last_message_at: row.last_message_at,
            last_message_preview: row.last_message_preview,
            created_at: row.created_at,
            updated_at: row.updated_at,
            item_title: row.item_title,
            item_price: row.item_price,
            item_photo: row.item_photo,
            item_status: row.item_status,
            unread_count: row.unread_count,
            other_user: UserSummary::new(
                row.other_user_id,
                row.other_user_first_name,
                row.other_user_last_name,
                row.other_user_email,
                row.other_user_profile_photo,
            ),
        }
    }
}

/// Message row joined with the sender's display fields.
#[derive(Debug, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub message_type: String,
    pub attachment_url: Option<String>,
    pub location_data: Option<serde_json::Value>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub sender_first_name: String,
    pub sender_last_name: String,
    pub sender_email: String,
    pub sender_profile_photo: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub message_type: String,
    pub attachment_url: Option<String>,
    pub location_data: Option<serde_json::Value>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub sender: UserSummary,
}

impl From<MessageRow> for MessageResponse {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            conversation_id: row.conversation_id,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            content: row.content,
            message_type: row.message_type,
            attachment_url: row.attachment_url,
            location_data: row.location_data,
            read_at: row.read_at,
            created_at: row.created_at,
            sender: UserSummary::new(
                row.sender_id,
                row.sender_first_name,
                row.sender_last_name,
                row.sender_email,
                row.sender_profile_photo,
            ),
        }
    }
}

impl MessageResponse {
    pub fn from_message(message: Message, sender: UserSummary) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            content: message.content,
            message_type: message.message_type,
            attachment_url: message.attachment_url,
            location_data: message.location_data,
            read_at: message.read_at,
            created_at: message.created_at,
            sender,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HasMessagesResponse {
    pub has_messages: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_request_defaults_to_text() {
        let req: SendMessageRequest =
            serde_json::from_str(r#"{ "content": "hello" }"#).unwrap();
        assert_eq!(req.message_type, "text");
        assert!(req.location_data.is_none());
    }

    #[test]
    fn test_send_message_request_parses_location_payload() {
        let req: SendMessageRequest = serde_json::from_str(
            r#"{
                "messageType": "location",
                "locationData": { "latitude": 40.7, "longitude": -74.0, "isLive": true }
            }"#,
        )
        .unwrap();

        assert_eq!(req.message_type, "location");
        let location = req.location_data.unwrap();
        assert_eq!(location.latitude, 40.7);
        assert!(location.is_live);
    }

    #[test]
    fn test_user_summary_builds_full_name() {
        let summary = UserSummary::new(
            Uuid::new_v4(),
            "Ada".to_string(),
            "Lovelace".to_string(),
            "ada@campus.edu".to_string(),
            None,
        );
        assert_eq!(summary.full_name, "Ada Lovelace");
    }
}
