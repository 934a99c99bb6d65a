use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::message_dto::{ConversationRow, MessageRow};
use super::message_models::{preview_of, Conversation, Message, MessageTemplate};
use crate::error::Result;

/// Conversation columns joined with item and counterpart display fields.
/// `$1` is always the caller: the unread counter and the "other user" are
/// both resolved relative to that side.
const ENRICHED_CONVERSATION: &str = "
    SELECT c.id, c.item_id, c.buyer_id, c.seller_id, c.status,
        c.last_message_at, c.last_message_preview, c.created_at, c.updated_at,
        i.title AS item_title,
        i.price AS item_price,
        i.primary_photo_url AS item_photo,
        i.status AS item_status,
        CASE WHEN c.buyer_id = $1 THEN c.unread_count_buyer
             ELSE c.unread_count_seller
        END AS unread_count,
        u.id AS other_user_id,
        u.first_name AS other_user_first_name,
        u.last_name AS other_user_last_name,
        u.email AS other_user_email,
        u.profile_photo_url AS other_user_profile_photo
    FROM conversations c
    LEFT JOIN items i ON c.item_id = i.id
    JOIN users u ON u.id = CASE WHEN c.buyer_id = $1 THEN c.seller_id
                                ELSE c.buyer_id
                           END";

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_item_seller(&self, item_id: Uuid) -> Result<Option<Uuid>> {
        let seller_id = sqlx::query_scalar(
            "SELECT seller_id FROM items WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(seller_id)
    }

    /// Resolve the single conversation for (item, buyer), creating it on
    /// first contact. The unique index turns a concurrent double-create
    /// into a no-op insert, so both racers re-fetch the same row.
    pub async fn get_or_create(
        &self,
        item_id: Uuid,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> Result<ConversationRow> {
        sqlx::query(
            "INSERT INTO conversations (item_id, buyer_id, seller_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (item_id, buyer_id) DO NOTHING",
        )
        .bind(item_id)
        .bind(buyer_id)
        .bind(seller_id)
        .execute(&self.pool)
        .await?;

        let query = format!(
            "{} WHERE c.item_id = $2 AND c.buyer_id = $1",
            ENRICHED_CONVERSATION
        );
        let row = sqlx::query_as::<_, ConversationRow>(&query)
            .bind(buyer_id)
            .bind(item_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ConversationRow>> {
        let query = format!(
            "{} WHERE (c.buyer_id = $1 OR c.seller_id = $1) AND c.status = 'active'
             ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC",
            ENRICHED_CONVERSATION
        );
        let rows = sqlx::query_as::<_, ConversationRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// The conversation, only if the given user is one of its two parties.
    pub async fn find_for_participant(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations
             WHERE id = $1 AND (buyer_id = $2 OR seller_id = $2)",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    /// Append a message and roll the conversation summary forward. The
    /// insert, the preview/timestamp update, and the recipient-side unread
    /// increment commit or roll back as one unit.
    pub async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: &str,
        message_type: &str,
        location_data: Option<serde_json::Value>,
    ) -> Result<Message> {
        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages
                (conversation_id, sender_id, recipient_id, content, message_type, location_data)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(recipient_id)
        .bind(content)
        .bind(message_type)
        .bind(location_data)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE conversations SET
                last_message_at = NOW(),
                last_message_preview = $1,
                unread_count_buyer = unread_count_buyer
                    + CASE WHEN buyer_id = $2 THEN 1 ELSE 0 END,
                unread_count_seller = unread_count_seller
                    + CASE WHEN seller_id = $2 THEN 1 ELSE 0 END,
                updated_at = NOW()
             WHERE id = $3",
        )
        .bind(preview_of(content))
        .bind(recipient_id)
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(message)
    }

    /// Newest-first page of messages, exclusive of the `before` cursor.
    /// Callers reverse before returning to the client.
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<MessageRow>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT m.id, m.conversation_id, m.sender_id, m.recipient_id,
                m.content, m.message_type, m.attachment_url, m.location_data,
                m.read_at, m.created_at,
                u.first_name AS sender_first_name,
                u.last_name AS sender_last_name,
                u.email AS sender_email,
                u.profile_photo_url AS sender_profile_photo
             FROM messages m
             JOIN users u ON u.id = m.sender_id
             WHERE m.conversation_id = $1
               AND ($2::timestamptz IS NULL OR m.created_at < $2)
             ORDER BY m.created_at DESC
             LIMIT $3",
        )
        .bind(conversation_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Flip every message addressed to the reader to read and zero the
    /// reader-side counter, atomically. Re-running with nothing unread
    /// leaves the same end state.
    pub async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE messages SET read_at = NOW()
             WHERE conversation_id = $1 AND recipient_id = $2 AND read_at IS NULL",
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE conversations SET
                unread_count_buyer = CASE WHEN buyer_id = $2 THEN 0
                                          ELSE unread_count_buyer
                                     END,
                unread_count_seller = CASE WHEN seller_id = $2 THEN 0
                                           ELSE unread_count_seller
                                      END
             WHERE id = $1",
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn has_messages(&self, conversation_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM messages WHERE conversation_id = $1)",
        )
        .bind(conversation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn archive(&self, conversation_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE conversations SET status = 'archived', updated_at = NOW()
             WHERE id = $1",
        )
        .bind(conversation_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_templates(&self) -> Result<Vec<MessageTemplate>> {
        let templates = sqlx::query_as::<_, MessageTemplate>(
            "SELECT id, content, is_active, display_order
             FROM message_templates
             WHERE is_active = TRUE
             ORDER BY display_order ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    pub async fn find_user_summary_fields(
        &self,
        user_id: Uuid,
    ) -> Result<(String, String, String, Option<String>)> {
        let row: (String, String, String, Option<String>) = sqlx::query_as(
            "SELECT first_name, last_name, email, profile_photo_url
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::message::message_dto::SendMessageRequest;
    use crate::message::message_service::MessageService;

    async fn seed_user(pool: &PgPool, email: &str) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO users (email, password_hash, first_name, last_name, university)
             VALUES ($1, 'hash', 'Test', 'User', 'State')
             RETURNING id",
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn seed_item(pool: &PgPool, seller_id: Uuid) -> Uuid {
        let category_id: Uuid = sqlx::query_scalar(
            "INSERT INTO categories (name, slug) VALUES ('Books', 'books')
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();

        sqlx::query_scalar(
            "INSERT INTO items (seller_id, category_id, title, description, price, condition, status)
             VALUES ($1, $2, 'Calculus textbook', 'Barely used', 25.0, 'good', 'available')
             RETURNING id",
        )
        .bind(seller_id)
        .bind(category_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn text_message(content: &str) -> SendMessageRequest {
        SendMessageRequest {
            content: Some(content.to_string()),
            message_type: "text".to_string(),
            location_data: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_get_or_create_returns_one_thread_per_buyer(pool: PgPool) {
        let repo = MessageRepository::new(pool.clone());
        let buyer = seed_user(&pool, "buyer@state.edu").await;
        let seller = seed_user(&pool, "seller@state.edu").await;
        let item = seed_item(&pool, seller).await;

        let first = repo.get_or_create(item, buyer, seller).await.unwrap();
        let second = repo.get_or_create(item, buyer, seller).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.unread_count, 0);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_append_increments_only_recipient_counter(pool: PgPool) {
        let repo = MessageRepository::new(pool.clone());
        let buyer = seed_user(&pool, "buyer@state.edu").await;
        let seller = seed_user(&pool, "seller@state.edu").await;
        let item = seed_item(&pool, seller).await;
        let conv = repo.get_or_create(item, buyer, seller).await.unwrap();

        repo.append_message(conv.id, buyer, seller, "Is this available?", "text", None)
            .await
            .unwrap();
        repo.append_message(conv.id, buyer, seller, "Still there?", "text", None)
            .await
            .unwrap();

        let state = repo.find_for_participant(conv.id, buyer).await.unwrap().unwrap();
        assert_eq!(state.unread_count_seller, 2);
        assert_eq!(state.unread_count_buyer, 0);
        assert_eq!(state.last_message_preview.as_deref(), Some("Still there?"));
        assert!(state.last_message_at.is_some());

        // A reply moves the other counter without resetting this one.
        repo.append_message(conv.id, seller, buyer, "Yes it is", "text", None)
            .await
            .unwrap();
        let state = repo.find_for_participant(conv.id, buyer).await.unwrap().unwrap();
        assert_eq!(state.unread_count_seller, 2);
        assert_eq!(state.unread_count_buyer, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_append_stores_truncated_preview(pool: PgPool) {
        let repo = MessageRepository::new(pool.clone());
        let buyer = seed_user(&pool, "buyer@state.edu").await;
        let seller = seed_user(&pool, "seller@state.edu").await;
        let item = seed_item(&pool, seller).await;
        let conv = repo.get_or_create(item, buyer, seller).await.unwrap();

        let long = "a".repeat(250);
        let message = repo
            .append_message(conv.id, buyer, seller, &long, "text", None)
            .await
            .unwrap();
        assert_eq!(message.content, long);

        let state = repo.find_for_participant(conv.id, buyer).await.unwrap().unwrap();
        let preview = state.last_message_preview.unwrap();
        assert_eq!(preview.chars().count(), 100);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_mark_read_is_idempotent(pool: PgPool) {
        let repo = MessageRepository::new(pool.clone());
        let buyer = seed_user(&pool, "buyer@state.edu").await;
        let seller = seed_user(&pool, "seller@state.edu").await;
        let item = seed_item(&pool, seller).await;
        let conv = repo.get_or_create(item, buyer, seller).await.unwrap();

        repo.append_message(conv.id, buyer, seller, "Hello", "text", None)
            .await
            .unwrap();
        repo.append_message(conv.id, buyer, seller, "Anyone home?", "text", None)
            .await
            .unwrap();

        repo.mark_read(conv.id, seller).await.unwrap();

        let state = repo.find_for_participant(conv.id, seller).await.unwrap().unwrap();
        assert_eq!(state.unread_count_seller, 0);

        let unread: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages
             WHERE conversation_id = $1 AND recipient_id = $2 AND read_at IS NULL",
        )
        .bind(conv.id)
        .bind(seller)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(unread, 0);

        let first_pass: Vec<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT read_at FROM messages WHERE conversation_id = $1 ORDER BY created_at")
                .bind(conv.id)
                .fetch_all(&pool)
                .await
                .unwrap();

        // Re-running with nothing unread changes no timestamps.
        repo.mark_read(conv.id, seller).await.unwrap();

        let second_pass: Vec<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT read_at FROM messages WHERE conversation_id = $1 ORDER BY created_at")
                .bind(conv.id)
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(first_pass, second_pass);

        let state = repo.find_for_participant(conv.id, seller).await.unwrap().unwrap();
        assert_eq!(state.unread_count_seller, 0);
        assert_eq!(state.unread_count_buyer, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_pagination_pages_backwards_without_overlap(pool: PgPool) {
        let repo = MessageRepository::new(pool.clone());
        let buyer = seed_user(&pool, "buyer@state.edu").await;
        let seller = seed_user(&pool, "seller@state.edu").await;
        let item = seed_item(&pool, seller).await;
        let conv = repo.get_or_create(item, buyer, seller).await.unwrap();

        for i in 0..5 {
            repo.append_message(conv.id, buyer, seller, &format!("message {}", i), "text", None)
                .await
                .unwrap();
        }

        let newest = repo.list_messages(conv.id, 2, None).await.unwrap();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].content, "message 4");

        let cursor = newest.last().unwrap().created_at;
        let older = repo.list_messages(conv.id, 10, Some(cursor)).await.unwrap();
        assert_eq!(older.len(), 3);
        assert!(older.iter().all(|m| m.created_at < cursor));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_non_participants_are_rejected(pool: PgPool) {
        let repo = MessageRepository::new(pool.clone());
        let service = MessageService::new(repo.clone());
        let buyer = seed_user(&pool, "buyer@state.edu").await;
        let seller = seed_user(&pool, "seller@state.edu").await;
        let stranger = seed_user(&pool, "stranger@state.edu").await;
        let item = seed_item(&pool, seller).await;
        let conv = repo.get_or_create(item, buyer, seller).await.unwrap();

        let err = service
            .list_messages(conv.id, stranger, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service
            .send_message(conv.id, stranger, text_message("let me in"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service.mark_read(conv.id, stranger).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Participants still get through.
        service
            .send_message(conv.id, buyer, text_message("hello"))
            .await
            .unwrap();
        let page = service.list_messages(conv.id, seller, None, None).await.unwrap();
        assert_eq!(page.len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_sending_to_archived_thread_is_rejected(pool: PgPool) {
        let repo = MessageRepository::new(pool.clone());
        let service = MessageService::new(repo.clone());
        let buyer = seed_user(&pool, "buyer@state.edu").await;
        let seller = seed_user(&pool, "seller@state.edu").await;
        let item = seed_item(&pool, seller).await;
        let conv = repo.get_or_create(item, buyer, seller).await.unwrap();

        service.archive(conv.id, buyer).await.unwrap();

        let err = service
            .send_message(conv.id, buyer, text_message("are you still there?"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let state = repo.find_for_participant(conv.id, seller).await.unwrap().unwrap();
        assert_eq!(state.unread_count_seller, 0);
    }
}
