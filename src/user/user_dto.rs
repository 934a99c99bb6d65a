use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub university: Option<String>,
    pub graduation_year: Option<i32>,
    pub major: Option<String>,
    pub location_text: Option<String>,
}
