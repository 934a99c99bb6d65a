use crate::error::{AppError, Result};
use crate::user::user_dto::UpdateProfileRequest;
use crate::user::user_models::{PublicProfile, User, UserResponse};
use crate::user::user_repository::UserRepository;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    pub async fn get_current_user(&self, user_id: Uuid) -> Result<UserResponse> {
        let user = self.require_user(user_id).await?;
        Ok(user.into())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        payload: UpdateProfileRequest,
    ) -> Result<UserResponse> {
        let user = self
            .repo
            .update_profile(
                user_id,
                payload.bio.as_deref(),
                payload.phone_number.as_deref(),
                payload.university.as_deref(),
                payload.graduation_year,
                payload.major.as_deref(),
                payload.location_text.as_deref(),
            )
            .await?;

        Ok(user.into())
    }

    pub async fn update_location(
        &self,
        user_id: Uuid,
        lat: f64,
        lng: f64,
        address: Option<&str>,
    ) -> Result<()> {
        self.repo.update_location(user_id, lat, lng, address).await
    }

    pub async fn update_photo(&self, user_id: Uuid, photo_url: &str) -> Result<()> {
        self.repo.update_photo(user_id, photo_url).await
    }

    pub async fn get_public_profile(&self, user_id: Uuid) -> Result<PublicProfile> {
        self.repo
            .find_public_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User> {
        self.repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
