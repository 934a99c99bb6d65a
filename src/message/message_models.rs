use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A 1:1 thread between one buyer and one item's seller. Unread counters
/// are denormalized per side and only ever mutated inside the same
/// transaction as the message write that triggers them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Conversation {
    pub id: Uuid,
    pub item_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub status: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_preview: Option<String>,
    pub unread_count_buyer: i32,
    pub unread_count_seller: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        user_id == self.buyer_id || user_id == self.seller_id
    }

    /// The other party of the thread. None when the given user is not a
    /// participant; threads are strictly two-sided so this derivation is
    /// total for participants.
    pub fn counterpart_of(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.buyer_id {
            Some(self.seller_id)
        } else if user_id == self.seller_id {
            Some(self.buyer_id)
        } else {
            None
        }
    }

    /// The unread counter belonging to the given participant's side.
    pub fn unread_for(&self, user_id: Uuid) -> i32 {
        if user_id == self.buyer_id {
            self.unread_count_buyer
        } else {
            self.unread_count_seller
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Message {
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
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MessageTemplate {
    pub id: Uuid,
    pub content: String,
    pub is_active: bool,
    pub display_order: i32,
}

/// Payload of a shared-location message, stored as JSONB on the row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub is_live: bool,
    pub timestamp: Option<i64>,
}

/// First 100 characters of a message, for the conversation list.
pub fn preview_of(content: &str) -> String {
    content.chars().take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(buyer: Uuid, seller: Uuid) -> Conversation {
        Conversation {
            id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            buyer_id: buyer,
            seller_id: seller,
            status: "active".to_string(),
            last_message_at: None,
            last_message_preview: None,
            unread_count_buyer: 2,
            unread_count_seller: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_counterpart_derivation() {
        let buyer = Uuid::new_v4();
        let seller = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let conv = conversation(buyer, seller);

        assert_eq!(conv.counterpart_of(buyer), Some(seller));
        assert_eq!(conv.counterpart_of(seller), Some(buyer));
        assert_eq!(conv.counterpart_of(stranger), None);
    }

    #[test]
    fn test_unread_is_side_relative() {
        let buyer = Uuid::new_v4();
        let seller = Uuid::new_v4();
        let conv = conversation(buyer, seller);

        assert_eq!(conv.unread_for(buyer), 2);
        assert_eq!(conv.unread_for(seller), 5);
    }

    #[test]
    fn test_preview_truncates_at_100_chars() {
        let short = "Is this available?";
        assert_eq!(preview_of(short), short);

        let long = "x".repeat(250);
        assert_eq!(preview_of(&long).chars().count(), 100);
    }

    #[test]
    fn test_preview_counts_chars_not_bytes() {
        let content = "é".repeat(120);
        let preview = preview_of(&content);
        assert_eq!(preview.chars().count(), 100);
    }
}
