use super::item_dto::{BrowseQuery, BrowseResponse, ListingForm, NewListing, SuggestionsResponse};
use super::item_models::{normalize_condition, Category, Item, ItemWithSeller, Photo};
use super::item_repository::ItemRepository;
use crate::error::{AppError, Result};
use uuid::Uuid;

#[derive(Clone)]
pub struct ItemService {
    item_repo: ItemRepository,
}

impl ItemService {
    pub fn new(item_repo: ItemRepository) -> Self {
        Self { item_repo }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.item_repo.list_categories().await
    }

    /// Validate the parsed form and publish (or draft) a new listing.
    /// Published listings need at least three photos; drafts can be bare.
    pub async fn create_listing(
        &self,
        seller_id: Uuid,
        form: ListingForm,
        photos: Vec<Photo>,
    ) -> Result<Item> {
        let status = form.status.clone().unwrap_or_else(|| "available".to_string());
        if status != "draft" && status != "available" {
            return Err(AppError::Validation(
                "status must be draft or available".to_string(),
            ));
        }

        if status == "available" {
            validate_required(&form)?;
            if photos.len() < 3 {
                return Err(AppError::Validation(
                    "At least 3 photos are required".to_string(),
                ));
            }
        }

        let listing = NewListing {
            title: form.title.unwrap_or_default(),
            description: form.description.unwrap_or_default(),
            price: form.price.unwrap_or(0.0),
            condition: normalize_condition(form.condition.as_deref().unwrap_or("good")),
            category_id: form
                .category_id
                .ok_or_else(|| AppError::Validation("category_id is required".to_string()))?,
            status,
            location_text: form.location_text.unwrap_or_default(),
            location_description: form.location_description,
            location_lat: form.location_lat,
            location_lng: form.location_lng,
            meetup_location_text: form.meetup_location_text.unwrap_or_default(),
            meetup_description: form.meetup_description,
            meetup_location_lat: form.meetup_location_lat,
            meetup_location_lng: form.meetup_location_lng,
            pickup_only: form.pickup_only.unwrap_or(false),
            willing_to_ship: form.willing_to_ship.unwrap_or(false),
            negotiable: form.negotiable.unwrap_or(false),
            firm: form.firm.unwrap_or(false),
            payment_methods: form
                .payment_methods
                .unwrap_or_else(|| serde_json::json!([])),
            open_to_trades: form.open_to_trades.unwrap_or(false),
            trade_description: form.trade_description,
            trade_preference: form.trade_preference,
            availability: form.availability.unwrap_or_else(|| serde_json::json!([])),
            special_instructions: form.special_instructions,
            photos,
        };

        self.item_repo.create(seller_id, &listing).await
    }

    pub async fn update_listing(
        &self,
        seller_id: Uuid,
        item_id: Uuid,
        form: ListingForm,
        new_photos: Option<Vec<Photo>>,
    ) -> Result<Item> {
        if !self.item_repo.is_owned_by(item_id, seller_id).await? {
            return Err(AppError::Forbidden(
                "You can only edit your own listings".to_string(),
            ));
        }

        self.item_repo
            .update(item_id, &form, new_photos.as_deref())
            .await
    }

    pub async fn delete_listing(&self, seller_id: Uuid, item_id: Uuid) -> Result<()> {
        let deleted = self.item_repo.soft_delete(item_id, seller_id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound("Item not found".to_string()));
        }
        Ok(())
    }

    pub async fn browse(&self, query: BrowseQuery) -> Result<BrowseResponse> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(24).clamp(1, 100);

        let (items, total) = self.item_repo.browse(&query).await?;
        let pages = (total as u32).div_ceil(limit);

        Ok(BrowseResponse {
            items,
            total,
            page,
            pages,
        })
    }

    pub async fn get_detail(
        &self,
        item_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> Result<ItemWithSeller> {
        let item = self
            .item_repo
            .find_detail(item_id, viewer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

        // View counting is fire-and-forget; the detail fetch does not wait
        // on it and a failed bump is not an error.
        if viewer_id != Some(item.seller_id) {
            if let Err(e) = self.item_repo.increment_view_count(item_id).await {
                tracing::warn!("failed to bump view count for {}: {}", item_id, e);
            }
        }

        Ok(item)
    }

    pub async fn my_listings(&self, seller_id: Uuid) -> Result<Vec<ItemWithSeller>> {
        self.item_repo.find_my_listings(seller_id).await
    }

    pub async fn saved_items(&self, user_id: Uuid) -> Result<Vec<ItemWithSeller>> {
        self.item_repo.find_saved(user_id).await
    }

    /// Toggle the saved flag for an item; returns the new state.
    pub async fn toggle_save(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        if self
            .item_repo
            .find_detail(item_id, None)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Item not found".to_string()));
        }

        if self.item_repo.is_saved(user_id, item_id).await? {
            self.item_repo.unsave(user_id, item_id).await?;
            Ok(false)
        } else {
            self.item_repo.save(user_id, item_id).await?;
            Ok(true)
        }
    }

    pub async fn search_suggestions(&self, q: &str) -> Result<SuggestionsResponse> {
        if q.trim().len() < 2 {
            return Ok(SuggestionsResponse {
                suggestions: vec![],
                categories: vec![],
            });
        }

        let (suggestions, categories) = self.item_repo.search_suggestions(q.trim()).await?;
        Ok(SuggestionsResponse {
            suggestions,
            categories,
        })
    }
}

fn validate_required(form: &ListingForm) -> Result<()> {
    let missing = |field: &str| AppError::Validation(format!("{} is required", field));

    match form.title.as_deref() {
        Some(t) if !t.trim().is_empty() => {}
        _ => return Err(missing("title")),
    }
    match form.description.as_deref() {
        Some(d) if !d.trim().is_empty() => {}
        _ => return Err(missing("description")),
    }
    match form.price {
        Some(p) if p >= 0.0 => {}
        Some(_) => {
            return Err(AppError::Validation(
                "price cannot be negative".to_string(),
            ))
        }
        None => return Err(missing("price")),
    }
    if form.condition.is_none() {
        return Err(missing("condition"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> ListingForm {
        ListingForm {
            title: Some("Mini fridge".to_string()),
            description: Some("Works great, moving out".to_string()),
            price: Some(60.0),
            condition: Some("Good".to_string()),
            ..ListingForm::default()
        }
    }

    #[test]
    fn test_validate_required_accepts_complete_form() {
        assert!(validate_required(&complete_form()).is_ok());
    }

    #[test]
    fn test_validate_required_rejects_blank_title() {
        let mut form = complete_form();
        form.title = Some("   ".to_string());
        assert!(validate_required(&form).is_err());
    }

    #[test]
    fn test_validate_required_rejects_negative_price() {
        let mut form = complete_form();
        form.price = Some(-5.0);
        assert!(validate_required(&form).is_err());
    }
}
