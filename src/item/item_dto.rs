use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::item_models::{Category, ItemWithSeller, Photo};
use crate::error::{AppError, Result};

/// Text fields of the listing-creation multipart form. Photos arrive as
/// separate file parts and are handled by the upload path.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListingForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub condition: Option<String>,
    pub category_id: Option<Uuid>,
    pub location_text: Option<String>,
    pub location_description: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub meetup_location_text: Option<String>,
    pub meetup_description: Option<String>,
    pub meetup_location_lat: Option<f64>,
    pub meetup_location_lng: Option<f64>,
    pub pickup_only: Option<bool>,
    pub willing_to_ship: Option<bool>,
    pub negotiable: Option<bool>,
    pub firm: Option<bool>,
    pub payment_methods: Option<serde_json::Value>,
    pub open_to_trades: Option<bool>,
    pub trade_description: Option<String>,
    pub trade_preference: Option<String>,
    pub availability: Option<serde_json::Value>,
    pub special_instructions: Option<String>,
    pub status: Option<String>,
}

impl ListingForm {
    /// Build the form from collected multipart text fields. Booleans arrive
    /// as "true"/"false" strings and JSON arrays as serialized text, the way
    /// browsers submit them.
    pub fn from_fields(fields: HashMap<String, String>) -> Result<Self> {
        let mut form = ListingForm::default();

        for (name, value) in fields {
            match name.as_str() {
                "title" => form.title = Some(value),
                "description" => form.description = Some(value),
                "price" => {
                    form.price = Some(value.parse().map_err(|_| {
                        AppError::Validation("price must be a number".to_string())
                    })?)
                }
                "condition" => form.condition = Some(value),
                "category_id" => {
                    form.category_id = Some(value.parse().map_err(|_| {
                        AppError::Validation("category_id must be a UUID".to_string())
                    })?)
                }
                "location_text" => form.location_text = Some(value),
                "location_description" => form.location_description = Some(value),
                "location_lat" => form.location_lat = parse_coord(&value, "location_lat")?,
                "location_lng" => form.location_lng = parse_coord(&value, "location_lng")?,
                "meetup_location_text" => form.meetup_location_text = Some(value),
                "meetup_description" => form.meetup_description = Some(value),
                "meetup_location_lat" => {
                    form.meetup_location_lat = parse_coord(&value, "meetup_location_lat")?
                }
                "meetup_location_lng" => {
                    form.meetup_location_lng = parse_coord(&value, "meetup_location_lng")?
                }
                "pickup_only" => form.pickup_only = Some(parse_bool(&value)),
                "willing_to_ship" => form.willing_to_ship = Some(parse_bool(&value)),
                "negotiable" => form.negotiable = Some(parse_bool(&value)),
                "firm" => form.firm = Some(parse_bool(&value)),
                "payment_methods" => form.payment_methods = parse_json_array(&value),
                "open_to_trades" => form.open_to_trades = Some(parse_bool(&value)),
                "trade_description" => form.trade_description = Some(value),
                "trade_preference" => form.trade_preference = Some(value),
                "availability" => form.availability = parse_json_array(&value),
                "special_instructions" => form.special_instructions = Some(value),
                "status" => form.status = Some(value),
                _ => {}
            }
        }

        Ok(form)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "true" | "on" | "1")
}

fn parse_coord(value: &str, field: &str) -> Result<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{} must be a number", field)))
}

fn parse_json_array(value: &str) -> Option<serde_json::Value> {
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(parsed) if parsed.is_array() => Some(parsed),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Comma-separated list of conditions.
    pub condition: Option<String>,
    pub transaction_type: Option<String>,
    pub date_posted: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub distance: Option<f64>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Filled in from the bearer token, never from the query string.
    #[serde(skip)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrowseResponse {
    pub items: Vec<ItemWithSeller>,
    pub total: i64,
    pub page: u32,
    pub pages: u32,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedItemsResponse {
    pub items: Vec<ItemWithSeller>,
}

/// Fully-parsed listing data handed to the repository.
#[derive(Debug)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub condition: String,
    pub category_id: Uuid,
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
    pub photos: Vec<Photo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_form_parses_booleans_and_numbers() {
        let form = ListingForm::from_fields(fields(&[
            ("title", "Desk lamp"),
            ("price", "15.50"),
            ("pickup_only", "true"),
            ("negotiable", "false"),
            ("open_to_trades", "on"),
            ("location_lat", "40.73"),
        ]))
        .unwrap();

        assert_eq!(form.title.as_deref(), Some("Desk lamp"));
        assert_eq!(form.price, Some(15.50));
        assert_eq!(form.pickup_only, Some(true));
        assert_eq!(form.negotiable, Some(false));
        assert_eq!(form.open_to_trades, Some(true));
        assert_eq!(form.location_lat, Some(40.73));
    }

    #[test]
    fn test_form_parses_json_arrays() {
        let form = ListingForm::from_fields(fields(&[(
            "payment_methods",
            r#"["cash", "venmo"]"#,
        )]))
        .unwrap();

        let methods = form.payment_methods.unwrap();
        assert_eq!(methods, serde_json::json!(["cash", "venmo"]));
    }

    #[test]
    fn test_form_rejects_bad_price() {
        let err = ListingForm::from_fields(fields(&[("price", "a lot")]));
        assert!(err.is_err());
    }

    #[test]
    fn test_form_ignores_malformed_json_arrays() {
        let form = ListingForm::from_fields(fields(&[("availability", "not json")])).unwrap();
        assert!(form.availability.is_none());
    }

    #[test]
    fn test_empty_coordinate_treated_as_absent() {
        let form = ListingForm::from_fields(fields(&[("location_lat", "")])).unwrap();
        assert!(form.location_lat.is_none());
    }
}
