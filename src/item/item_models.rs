use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub icon_name: Option<String>,
    pub parent_category_id: Option<Uuid>,
    pub sort_order: i32,
}

/// A stored listing photo, kept as JSONB alongside the item row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Photo {
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub condition: String,
    pub status: String,
    pub location_text: String,
    pub location_description: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub meetup_location_text: String,
    pub meetup_description: Option<String>,
    pub meetup_location_lat: Option<f64>,
    pub meetup_location_lng: Option<f64>,
    pub pickup_only: bool,
    pub willing_to_ship: bool,
    pub negotiable: bool,
    pub firm: bool,
    pub payment_methods: serde_json::Value,
    pub open_to_trades: bool,
    pub trade_description: Option<String>,
    pub trade_preference: Option<String>,
    pub availability: serde_json::Value,
    pub special_instructions: Option<String>,
    pub photos: serde_json::Value,
    pub primary_photo_url: Option<String>,
    pub view_count: i32,
    pub save_count: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Item row annotated with category and seller display fields for browse,
/// saved-items, and detail responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ItemWithSeller {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub condition: String,
    pub status: String,
    pub location_text: String,
    pub location_description: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub meetup_location_text: String,
    pub meetup_description: Option<String>,
    pub pickup_only: bool,
    pub willing_to_ship: bool,
    pub negotiable: bool,
    pub firm: bool,
    pub payment_methods: serde_json::Value,
    pub open_to_trades: bool,
    pub trade_description: Option<String>,
    pub trade_preference: Option<String>,
    pub availability: serde_json::Value,
    pub special_instructions: Option<String>,
    pub photos: serde_json::Value,
    pub primary_photo_url: Option<String>,
    pub view_count: i32,
    pub save_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category_name: String,
    pub icon_name: Option<String>,
    pub seller_first_name: String,
    pub seller_last_name: String,
    pub seller_photo: Option<String>,
    pub distance: Option<f64>,
    pub is_saved: bool,
}

/// Normalize free-form condition labels to the stored values.
pub fn normalize_condition(condition: &str) -> String {
    match condition {
        "brand_new" | "Brand New" => "brand_new".to_string(),
        "like_new" | "Like New" => "like_new".to_string(),
        "good" | "Good" => "good".to_string(),
        "fair" | "Fair" => "fair".to_string(),
        "for_parts" | "For Parts" => "for_parts".to_string(),
        other => other.to_lowercase().replace(char::is_whitespace, "_"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_condition_known_labels() {
        assert_eq!(normalize_condition("Brand New"), "brand_new");
        assert_eq!(normalize_condition("like_new"), "like_new");
        assert_eq!(normalize_condition("Good"), "good");
        assert_eq!(normalize_condition("For Parts"), "for_parts");
    }

    #[test]
    fn test_normalize_condition_fallback() {
        assert_eq!(normalize_condition("Very Used"), "very_used");
    }
}
