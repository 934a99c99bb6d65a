use super::item_dto::{BrowseQuery, ListingForm, NewListing};
use super::item_models::{Category, Item, ItemWithSeller, Photo};
use crate::error::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const ITEM_WITH_SELLER_COLUMNS: &str = "
    i.id, i.seller_id, i.category_id, i.title, i.description, i.price,
    i.condition, i.status, i.location_text, i.location_description,
    i.location_lat, i.location_lng, i.meetup_location_text,
    i.meetup_description, i.pickup_only, i.willing_to_ship, i.negotiable,
    i.firm, i.payment_methods, i.open_to_trades, i.trade_description,
    i.trade_preference, i.availability, i.special_instructions, i.photos,
    i.primary_photo_url, i.view_count, i.save_count, i.created_at,
    i.updated_at, c.name AS category_name, c.icon_name,
    u.first_name AS seller_first_name, u.last_name AS seller_last_name,
    u.profile_photo_url AS seller_photo";

#[derive(Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, icon_name, parent_category_id, sort_order
             FROM categories
             WHERE is_active = TRUE
             ORDER BY sort_order, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn seed_default_categories(&self) -> Result<()> {
        sqlx::query(
            "INSERT INTO categories (name, slug, sort_order) VALUES
                ('Books & Study Materials', 'books-study-materials', 1),
                ('Electronics', 'electronics', 2),
                ('Furniture', 'furniture', 3),
                ('Clothing & Accessories', 'clothing-accessories', 4),
                ('Sports & Recreation', 'sports-recreation', 5),
                ('Appliances', 'appliances', 6),
                ('Vehicles', 'vehicles', 7),
                ('Other', 'other', 8)
             ON CONFLICT (slug) DO NOTHING",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create(&self, seller_id: Uuid, listing: &NewListing) -> Result<Item> {
        let photos = serde_json::to_value(&listing.photos).unwrap_or_default();
        let primary_photo_url = listing.photos.first().map(|p: &Photo| p.url.clone());

        let item = sqlx::query_as::<_, Item>(
            "INSERT INTO items (
                seller_id, category_id, title, description, price, condition,
                status, location_text, location_description, location_lat,
                location_lng, meetup_location_text, meetup_description,
                meetup_location_lat, meetup_location_lng, pickup_only,
                willing_to_ship, negotiable, firm, payment_methods,
                open_to_trades, trade_description, trade_preference,
                availability, special_instructions, photos, primary_photo_url
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                     $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24,
                     $25, $26, $27)
             RETURNING *",
        )
        .bind(seller_id)
        .bind(listing.category_id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.price)
        .bind(&listing.condition)
        .bind(&listing.status)
        .bind(&listing.location_text)
        .bind(&listing.location_description)
        .bind(listing.location_lat)
        .bind(listing.location_lng)
        .bind(&listing.meetup_location_text)
        .bind(&listing.meetup_description)
        .bind(listing.meetup_location_lat)
        .bind(listing.meetup_location_lng)
        .bind(listing.pickup_only)
        .bind(listing.willing_to_ship)
        .bind(listing.negotiable)
        .bind(listing.firm)
        .bind(&listing.payment_methods)
        .bind(listing.open_to_trades)
        .bind(&listing.trade_description)
        .bind(&listing.trade_preference)
        .bind(&listing.availability)
        .bind(&listing.special_instructions)
        .bind(photos)
        .bind(primary_photo_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn is_owned_by(&self, item_id: Uuid, seller_id: Uuid) -> Result<bool> {
        let owned: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM items WHERE id = $1 AND seller_id = $2")
                .bind(item_id)
                .bind(seller_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(owned.is_some())
    }

    pub async fn update(
        &self,
        item_id: Uuid,
        listing: &ListingForm,
        photos: Option<&[Photo]>,
    ) -> Result<Item> {
        let photos_json = photos.map(|p| serde_json::to_value(p).unwrap_or_default());
        let primary_photo_url = photos.and_then(|p| p.first().map(|photo| photo.url.clone()));
        let condition = listing
            .condition
            .as_deref()
            .map(super::item_models::normalize_condition);

        let item = sqlx::query_as::<_, Item>(
            "UPDATE items SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                price = COALESCE($3, price),
                condition = COALESCE($4, condition),
                category_id = COALESCE($5, category_id),
                status = COALESCE($6, status),
                location_text = COALESCE($7, location_text),
                location_description = COALESCE($8, location_description),
                location_lat = COALESCE($9, location_lat),
                location_lng = COALESCE($10, location_lng),
                meetup_location_text = COALESCE($11, meetup_location_text),
                meetup_description = COALESCE($12, meetup_description),
                meetup_location_lat = COALESCE($13, meetup_location_lat),
                meetup_location_lng = COALESCE($14, meetup_location_lng),
                pickup_only = COALESCE($15, pickup_only),
                willing_to_ship = COALESCE($16, willing_to_ship),
                negotiable = COALESCE($17, negotiable),
                firm = COALESCE($18, firm),
                payment_methods = COALESCE($19, payment_methods),
                open_to_trades = COALESCE($20, open_to_trades),
                trade_description = COALESCE($21, trade_description),
                trade_preference = COALESCE($22, trade_preference),
                availability = COALESCE($23, availability),
                special_instructions = COALESCE($24, special_instructions),
                photos = COALESCE($25, photos),
                primary_photo_url = COALESCE($26, primary_photo_url),
                updated_at = NOW()
             WHERE id = $27
             RETURNING *",
        )
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.price)
        .bind(condition)
        .bind(listing.category_id)
        .bind(&listing.status)
        .bind(&listing.location_text)
        .bind(&listing.location_description)
        .bind(listing.location_lat)
        .bind(listing.location_lng)
        .bind(&listing.meetup_location_text)
        .bind(&listing.meetup_description)
        .bind(listing.meetup_location_lat)
        .bind(listing.meetup_location_lng)
        .bind(listing.pickup_only)
        .bind(listing.willing_to_ship)
        .bind(listing.negotiable)
        .bind(listing.firm)
        .bind(&listing.payment_methods)
        .bind(listing.open_to_trades)
        .bind(&listing.trade_description)
        .bind(&listing.trade_preference)
        .bind(&listing.availability)
        .bind(&listing.special_instructions)
        .bind(photos_json)
        .bind(primary_photo_url)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn soft_delete(&self, item_id: Uuid, seller_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE items
             SET deleted_at = NOW(), status = 'unavailable'
             WHERE id = $1 AND seller_id = $2 AND deleted_at IS NULL",
        )
        .bind(item_id)
        .bind(seller_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn find_my_listings(&self, seller_id: Uuid) -> Result<Vec<ItemWithSeller>> {
        let query = format!(
            "SELECT {columns}, NULL::DOUBLE PRECISION AS distance, FALSE AS is_saved
             FROM items i
             JOIN categories c ON i.category_id = c.id
             JOIN users u ON i.seller_id = u.id
             WHERE i.seller_id = $1 AND i.deleted_at IS NULL
             ORDER BY i.created_at DESC",
            columns = ITEM_WITH_SELLER_COLUMNS
        );

        let items = sqlx::query_as::<_, ItemWithSeller>(&query)
            .bind(seller_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    pub async fn find_detail(
        &self,
        item_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> Result<Option<ItemWithSeller>> {
        let query = format!(
            "SELECT {columns}, NULL::DOUBLE PRECISION AS distance,
                CASE WHEN $2::uuid IS NULL THEN FALSE
                     ELSE EXISTS (
                        SELECT 1 FROM saved_items si
                        WHERE si.user_id = $2 AND si.item_id = i.id
                     )
                END AS is_saved
             FROM items i
             LEFT JOIN categories c ON i.category_id = c.id
             LEFT JOIN users u ON i.seller_id = u.id
             WHERE i.id = $1 AND i.deleted_at IS NULL",
            columns = ITEM_WITH_SELLER_COLUMNS
        );

        let item = sqlx::query_as::<_, ItemWithSeller>(&query)
            .bind(item_id)
            .bind(viewer_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Filtered public browse. Distance is a haversine computed from plain
    /// lat/lng columns, in miles; rows without coordinates keep a NULL
    /// distance and are never excluded by the radius filter.
    pub async fn browse(&self, query: &BrowseQuery) -> Result<(Vec<ItemWithSeller>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(24).clamp(1, 100);
        let offset = ((page - 1) * limit) as i64;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder.push(ITEM_WITH_SELLER_COLUMNS);

        if let (Some(lat), Some(lng)) = (query.lat, query.lng) {
            builder
                .push(", ROUND((3958.8 * acos(LEAST(1.0, cos(radians(")
                .push_bind(lat)
                .push(")) * cos(radians(i.location_lat)) * cos(radians(i.location_lng) - radians(")
                .push_bind(lng)
                .push(")) + sin(radians(")
                .push_bind(lat)
                .push(")) * sin(radians(i.location_lat)))))::numeric, 1)::DOUBLE PRECISION AS distance");
        } else {
            builder.push(", NULL::DOUBLE PRECISION AS distance");
        }

        if let Some(user_id) = query.user_id {
            builder
                .push(", EXISTS (SELECT 1 FROM saved_items si WHERE si.user_id = ")
                .push_bind(user_id)
                .push(" AND si.item_id = i.id) AS is_saved");
        } else {
            builder.push(", FALSE AS is_saved");
        }

        builder.push(
            " FROM items i
              LEFT JOIN categories c ON i.category_id = c.id
              LEFT JOIN users u ON i.seller_id = u.id
              WHERE ",
        );
        self.push_browse_filters(&mut builder, query);

        builder.push(" ORDER BY ");
        builder.push(order_by_clause(query));
        builder.push(" LIMIT ");
        builder.push_bind(limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let items = builder
            .build_query_as::<ItemWithSeller>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM items i WHERE ");
        self.push_browse_filters(&mut count_builder, query);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((items, total))
    }

    fn push_browse_filters(&self, builder: &mut QueryBuilder<Postgres>, query: &BrowseQuery) {
        builder.push("i.status = 'available' AND i.deleted_at IS NULL");

        if let Some(user_id) = query.user_id {
            builder.push(" AND i.seller_id != ").push_bind(user_id);
        }

        if let Some(ref search) = query.search {
            if !search.is_empty() {
                let pattern = format!("%{}%", search);
                builder
                    .push(" AND (i.title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR i.description ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        if let Some(category_id) = query.category_id {
            builder.push(" AND i.category_id = ").push_bind(category_id);
        }

        if let Some(min_price) = query.min_price {
            builder.push(" AND i.price >= ").push_bind(min_price);
        }

        if let Some(max_price) = query.max_price {
            builder.push(" AND i.price <= ").push_bind(max_price);
        }

        if let Some(ref condition) = query.condition {
            let conditions: Vec<String> = condition
                .split(',')
                .map(super::item_models::normalize_condition)
                .collect();
            builder
                .push(" AND i.condition = ANY(")
                .push_bind(conditions)
                .push(")");
        }

        match query.transaction_type.as_deref() {
            Some("cash") => {
                builder.push(" AND i.payment_methods @> '[\"cash\"]'::jsonb");
            }
            Some("digital") => {
                builder.push(
                    " AND (i.payment_methods @> '[\"venmo\"]'::jsonb
                       OR i.payment_methods @> '[\"paypal\"]'::jsonb
                       OR i.payment_methods @> '[\"zelle\"]'::jsonb)",
                );
            }
            Some("trade") => {
                builder.push(" AND i.open_to_trades = TRUE");
            }
            _ => {}
        }

        match query.date_posted.as_deref() {
            Some("today") => {
                builder.push(" AND i.created_at >= NOW() - INTERVAL '24 hours'");
            }
            Some("week") => {
                builder.push(" AND i.created_at >= NOW() - INTERVAL '7 days'");
            }
            Some("month") => {
                builder.push(" AND i.created_at >= NOW() - INTERVAL '30 days'");
            }
            _ => {}
        }

        if let (Some(lat), Some(lng)) = (query.lat, query.lng) {
            let radius = query.distance.unwrap_or(50.0);
            if radius > 0.0 && radius < 100.0 {
                builder
                    .push(" AND (i.location_lat IS NULL OR (3958.8 * acos(LEAST(1.0, cos(radians(")
                    .push_bind(lat)
                    .push(")) * cos(radians(i.location_lat)) * cos(radians(i.location_lng) - radians(")
                    .push_bind(lng)
                    .push(")) + sin(radians(")
                    .push_bind(lat)
                    .push(")) * sin(radians(i.location_lat))))) <= ")
                    .push_bind(radius)
                    .push(")");
            }
        }
    }

    pub async fn increment_view_count(&self, item_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE items SET view_count = view_count + 1 WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn is_saved(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        let saved: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM saved_items WHERE user_id = $1 AND item_id = $2")
                .bind(user_id)
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(saved.is_some())
    }

    /// Save/unsave and the save_count adjustment commit together.
    pub async fn save(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO saved_items (user_id, item_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE items SET save_count = save_count + 1 WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn unsave(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM saved_items WHERE user_id = $1 AND item_id = $2")
            .bind(user_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE items SET save_count = GREATEST(save_count - 1, 0) WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_saved(&self, user_id: Uuid) -> Result<Vec<ItemWithSeller>> {
        let query = format!(
            "SELECT {columns}, NULL::DOUBLE PRECISION AS distance, TRUE AS is_saved
             FROM saved_items si
             JOIN items i ON si.item_id = i.id
             LEFT JOIN categories c ON i.category_id = c.id
             LEFT JOIN users u ON i.seller_id = u.id
             WHERE si.user_id = $1 AND i.deleted_at IS NULL
             ORDER BY si.created_at DESC",
            columns = ITEM_WITH_SELLER_COLUMNS
        );

        let items = sqlx::query_as::<_, ItemWithSeller>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    pub async fn search_suggestions(&self, q: &str) -> Result<(Vec<String>, Vec<Category>)> {
        let pattern = format!("%{}%", q);

        let titles: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT title FROM items
             WHERE deleted_at IS NULL
               AND (title ILIKE $1 OR description ILIKE $1)
             ORDER BY title
             LIMIT 5",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, icon_name, parent_category_id, sort_order
             FROM categories
             WHERE is_active = TRUE AND name ILIKE $1
             ORDER BY sort_order, name
             LIMIT 3",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok((titles, categories))
    }
}

fn order_by_clause(query: &BrowseQuery) -> &'static str {
    match query.sort_by.as_deref() {
        Some("price_low") => "i.price ASC, i.created_at DESC",
        Some("price_high") => "i.price DESC, i.created_at DESC",
        Some("nearest") if query.lat.is_some() && query.lng.is_some() => {
            "distance ASC NULLS LAST, i.created_at DESC"
        }
        Some("popular") => "(i.view_count + i.save_count * 2) DESC, i.created_at DESC",
        _ => "i.created_at DESC",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_with_sort(sort_by: Option<&str>, coords: bool) -> BrowseQuery {
        BrowseQuery {
            search: None,
            category_id: None,
            min_price: None,
            max_price: None,
            condition: None,
            transaction_type: None,
            date_posted: None,
            lat: coords.then_some(40.7),
            lng: coords.then_some(-74.0),
            distance: None,
            sort_by: sort_by.map(String::from),
            page: None,
            limit: None,
            user_id: None,
        }
    }

    #[test]
    fn test_order_by_defaults_to_newest() {
        assert_eq!(
            order_by_clause(&query_with_sort(None, false)),
            "i.created_at DESC"
        );
    }

    #[test]
    fn test_order_by_nearest_requires_coords() {
        assert_eq!(
            order_by_clause(&query_with_sort(Some("nearest"), false)),
            "i.created_at DESC"
        );
        assert_eq!(
            order_by_clause(&query_with_sort(Some("nearest"), true)),
            "distance ASC NULLS LAST, i.created_at DESC"
        );
    }

    #[test]
    fn test_order_by_price_sorts() {
        assert_eq!(
            order_by_clause(&query_with_sort(Some("price_low"), false)),
            "i.price ASC, i.created_at DESC"
        );
        assert_eq!(
            order_by_clause(&query_with_sort(Some("price_high"), false)),
            "i.price DESC, i.created_at DESC"
        );
    }
}
