use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub university: String,
    pub graduation_year: Option<i32>,
    pub major: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub profile_photo_url: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub location_text: Option<String>,
    pub email_verified: bool,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub university: String,
    pub graduation_year: Option<i32>,
    pub major: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub profile_photo_url: Option<String>,
    pub location_text: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            university: user.university,
            graduation_year: user.graduation_year,
            major: user.major,
            bio: user.bio,
            phone_number: user.phone_number,
            profile_photo_url: user.profile_photo_url,
            location_text: user.location_text,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

/// Display fields another user is allowed to see.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PublicProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub university: String,
    pub bio: Option<String>,
    pub profile_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
