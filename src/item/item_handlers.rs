use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    middleware::{AuthUser, MaybeAuthUser},
    state::AppState,
    user::user_handlers::extension_for,
};

use super::item_dto::{BrowseQuery, ListingForm, SavedItemsResponse, SuggestionsQuery};
use super::item_models::Photo;

/// Browse available listings
#[utoipa::path(
    get,
    path = "/api/items",
    tag = "items",
    responses(
        (status = 200, description = "Paginated listings with filters applied")
    )
)]
pub async fn browse_items(
    State(state): State<AppState>,
    MaybeAuthUser(viewer_id): MaybeAuthUser,
    Query(mut query): Query<BrowseQuery>,
) -> Result<impl IntoResponse> {
    query.user_id = viewer_id;
    let response = state.item_service.browse(query).await?;

    Ok((StatusCode::OK, Json(response)))
}

// ... (list_categories)
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let categories = state.item_service.list_categories().await?;

    Ok(Json(json!({ "categories": categories })))
}

// ... (search_suggestions)
pub async fn search_suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionsQuery>,
) -> Result<impl IntoResponse> {
    let response = state.item_service.search_suggestions(&query.q).await?;

    Ok((StatusCode::OK, Json(response)))
}

/// Create a listing from a multipart form
#[utoipa::path(
    post,
    path = "/api/items",
    tag = "items",
    responses(
        (status = 201, description = "Listing created"),
        (status = 400, description = "Invalid or incomplete listing"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let dir = listings_dir(&state);
    let (fields, photos) = collect_listing_parts(&dir, multipart).await?;

    // A rejected listing must not leave its uploads behind on disk.
    let result = match ListingForm::from_fields(fields) {
        Ok(form) => {
            state
                .item_service
                .create_listing(user_id, form, photos.clone())
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(item) => Ok((StatusCode::CREATED, Json(item))),
        Err(e) => {
            discard_photos(&dir, &photos).await;
            Err(e)
        }
    }
}

// ... (update_item)
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let dir = listings_dir(&state);
    let (fields, photos) = collect_listing_parts(&dir, multipart).await?;

    let result = match ListingForm::from_fields(fields) {
        Ok(form) => {
            let new_photos = if photos.is_empty() {
                None
            } else {
                Some(photos.clone())
            };
            state
                .item_service
                .update_listing(user_id, item_id, form, new_photos)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(item) => Ok((StatusCode::OK, Json(item))),
        Err(e) => {
            discard_photos(&dir, &photos).await;
            Err(e)
        }
    }
}

// ... (delete_item)
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.item_service.delete_listing(user_id, item_id).await?;

    Ok(Json(json!({ "success": true })))
}

// ... (my_listings)
pub async fn my_listings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let items = state.item_service.my_listings(user_id).await?;

    Ok(Json(json!({ "items": items })))
}

// ... (saved_items)
pub async fn saved_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let items = state.item_service.saved_items(user_id).await?;

    Ok((StatusCode::OK, Json(SavedItemsResponse { items })))
}

// ... (toggle_save)
pub async fn toggle_save(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let saved = state.item_service.toggle_save(user_id, item_id).await?;

    Ok(Json(json!({ "saved": saved })))
}

/// Get a single listing with seller details
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "items",
    responses(
        (status = 200, description = "Listing detail"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    MaybeAuthUser(viewer_id): MaybeAuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let item = state.item_service.get_detail(item_id, viewer_id).await?;

    Ok((StatusCode::OK, Json(item)))
}

fn listings_dir(state: &AppState) -> String {
    format!("{}/listings", state.config.upload_dir)
}

/// Drain the multipart stream: text parts accumulate into the form field
/// map, "photos" file parts are written to disk and become Photo entries.
/// On error, files written so far are removed before the error surfaces.
async fn collect_listing_parts(
    dir: &str,
    multipart: Multipart,
) -> Result<(HashMap<String, String>, Vec<Photo>)> {
    let mut photos = Vec::new();

    match drain_parts(dir, multipart, &mut photos).await {
        Ok(fields) => Ok((fields, photos)),
        Err(e) => {
            discard_photos(dir, &photos).await;
            Err(e)
        }
    }
}

async fn drain_parts(
    dir: &str,
    mut multipart: Multipart,
    photos: &mut Vec<Photo>,
) -> Result<HashMap<String, String>> {
    const MAX_PHOTOS: usize = 10;

    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart payload".to_string()))?
    {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if name == "photos" {
            if photos.len() >= MAX_PHOTOS {
                return Err(AppError::Validation(
                    "At most 10 photos are allowed".to_string(),
                ));
            }

            let content_type = field.content_type().unwrap_or_default().to_string();
            if !content_type.starts_with("image/") {
                return Err(AppError::BadRequest(
                    "Only image files are allowed".to_string(),
                ));
            }

            let extension = extension_for(&content_type);
            let data = field
                .bytes()
                .await
                .map_err(|_| AppError::BadRequest("Failed to read uploaded file".to_string()))?;
            if data.len() > 10 * 1024 * 1024 {
                return Err(AppError::Validation(
                    "Photos must be 10MB or smaller".to_string(),
                ));
            }

            let filename = format!("{}.{}", Uuid::new_v4(), extension);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|_| AppError::InternalError)?;
            tokio::fs::write(format!("{}/{}", dir, filename), &data)
                .await
                .map_err(|_| AppError::InternalError)?;

            photos.push(Photo {
                url: format!("/uploads/listings/{}", filename),
                filename,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|_| AppError::BadRequest("Invalid multipart payload".to_string()))?;
            fields.insert(name, value);
        }
    }

    Ok(fields)
}

/// Remove uploads that did not end up attached to a listing row.
async fn discard_photos(dir: &str, photos: &[Photo]) {
    for photo in photos {
        let path = format!("{}/{}", dir, photo.filename);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove orphaned upload {}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_discard_photos_removes_written_files() {
        let dir = std::env::temp_dir().join(format!("listings-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let filename = format!("{}.jpg", Uuid::new_v4());
        let path = dir.join(&filename);
        tokio::fs::write(&path, b"jpeg bytes").await.unwrap();
        assert!(path.exists());

        let photos = vec![Photo {
            url: format!("/uploads/listings/{}", filename),
            filename,
        }];
        discard_photos(dir.to_str().unwrap(), &photos).await;

        assert!(!path.exists());
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
