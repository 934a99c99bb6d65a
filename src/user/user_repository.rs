use super::user_models::{PublicProfile, User};
use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        university: &str,
        graduation_year: Option<i32>,
        major: Option<&str>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, first_name, last_name, university, graduation_year, major)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(university)
        .bind(graduation_year)
        .bind(major)
        .fetch_one(&mut **tx)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> Result<bool> {
        let taken: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE email = $1 AND id != $2")
                .bind(email)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(taken.is_some())
    }

    pub async fn set_email_verified(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn update_email_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: Uuid,
        email: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET email = $1, email_verified = TRUE, updated_at = NOW() WHERE id = $2",
        )
        .bind(email)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn update_password_by_email(&self, email: &str, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE email = $2")
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn touch_last_active(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_active_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        bio: Option<&str>,
        phone_number: Option<&str>,
        university: Option<&str>,
        graduation_year: Option<i32>,
        major: Option<&str>,
        location_text: Option<&str>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET
                bio = COALESCE($1, bio),
                phone_number = COALESCE($2, phone_number),
                university = COALESCE($3, university),
                graduation_year = COALESCE($4, graduation_year),
                major = COALESCE($5, major),
                location_text = COALESCE($6, location_text),
                updated_at = NOW()
             WHERE id = $7
             RETURNING *",
        )
        .bind(bio)
        .bind(phone_number)
        .bind(university)
        .bind(graduation_year)
        .bind(major)
        .bind(location_text)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_location(
        &self,
        user_id: Uuid,
        lat: f64,
        lng: f64,
        address: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET location_lat = $1, location_lng = $2, location_text = $3, updated_at = NOW()
             WHERE id = $4",
        )
        .bind(lat)
        .bind(lng)
        .bind(address)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_photo(&self, user_id: Uuid, photo_url: &str) -> Result<()> {
        sqlx::query("UPDATE users SET profile_photo_url = $1, updated_at = NOW() WHERE id = $2")
            .bind(photo_url)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_public_profile(&self, user_id: Uuid) -> Result<Option<PublicProfile>> {
        let profile = sqlx::query_as::<_, PublicProfile>(
            "SELECT id, first_name, last_name, university, bio, profile_photo_url, created_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
