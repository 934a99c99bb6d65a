use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::auth_dto::UpdateLocationRequest,
    error::{AppError, Result},
    middleware::AuthUser,
    state::AppState,
    user::user_dto::UpdateProfileRequest,
};

/// Get current user profile
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "User profile retrieved successfully"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get_current_user(user_id).await?;

    Ok((StatusCode::OK, Json(user)))
}

/// Update current user profile
#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully"),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_current_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let user = state.user_service.update_profile(user_id, payload).await?;

    Ok((StatusCode::OK, Json(user)))
}

// ... (update_location)
pub async fn update_location(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<impl IntoResponse> {
    // Best effort: resolve a display address when the client did not send one.
    let address = match payload.address {
        Some(ref address) => Some(address.clone()),
        None => state.geocoding.reverse(payload.lat, payload.lng).await,
    };

    state
        .user_service
        .update_location(user_id, payload.lat, payload.lng, address.as_deref())
        .await?;

    Ok(Json(json!({ "success": true })))
}

// ... (upload_photo)
pub async fn upload_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart payload".to_string()))?
    {
        if field.name() != Some("photo") {
            continue;
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

        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let dir = &state.config.upload_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|_| AppError::InternalError)?;
        tokio::fs::write(format!("{}/{}", dir, filename), &data)
            .await
            .map_err(|_| AppError::InternalError)?;

        let photo_url = format!("/uploads/{}", filename);
        state.user_service.update_photo(user_id, &photo_url).await?;

        return Ok(Json(json!({ "success": true, "photoUrl": photo_url })));
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}

// ... (get_public_profile)
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let profile = state.user_service.get_public_profile(user_id).await?;

    Ok((StatusCode::OK, Json(profile)))
}

pub(crate) fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/gif"), "gif");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/unknown"), "jpg");
    }
}
