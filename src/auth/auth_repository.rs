use super::auth_models::{EmailVerification, PasswordReset};
use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Storage for email-verification tokens and password-reset OTPs.
#[derive(Clone)]
pub struct VerificationRepository {
    pool: PgPool,
}

impl VerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_email_verification_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<EmailVerification> {
        let verification = sqlx::query_as::<_, EmailVerification>(
            "INSERT INTO email_verifications (token, user_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&mut **tx)
        .await?;

        Ok(verification)
    }

    pub async fn create_email_verification(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<EmailVerification> {
        let verification = sqlx::query_as::<_, EmailVerification>(
            "INSERT INTO email_verifications (token, user_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(verification)
    }

    pub async fn find_valid_verification(&self, token: &str) -> Result<Option<EmailVerification>> {
        let verification = sqlx::query_as::<_, EmailVerification>(
            "SELECT * FROM email_verifications
             WHERE token = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(verification)
    }

    pub async fn delete_verification(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM email_verifications WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete_verification_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        token: &str,
    ) -> Result<()> {
        sqlx::query("DELETE FROM email_verifications WHERE token = $1")
            .bind(token)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub async fn create_password_reset(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            "INSERT INTO password_resets (email, token, expires_at)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(email)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(reset)
    }

    pub async fn find_valid_reset(&self, email: &str, token: &str) -> Result<Option<PasswordReset>> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            "SELECT * FROM password_resets
             WHERE email = $1 AND token = $2 AND expires_at > NOW()",
        )
        .bind(email)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reset)
    }

    pub async fn find_valid_reset_by_token(&self, token: &str) -> Result<Option<PasswordReset>> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            "SELECT * FROM password_resets
             WHERE token = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reset)
    }

    pub async fn delete_resets_by_email(&self, email: &str) -> Result<()> {
        sqlx::query("DELETE FROM password_resets WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete_reset_by_token(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM password_resets WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete_expired(&self) -> Result<u64> {
        let verifications = sqlx::query("DELETE FROM email_verifications WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        let resets = sqlx::query("DELETE FROM password_resets WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(verifications.rows_affected() + resets.rows_affected())
    }
}
