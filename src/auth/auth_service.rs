use crate::auth::auth_dto::RegisterRequest;
use crate::auth::auth_repository::VerificationRepository;
use crate::auth::{create_jwt, hash_password, verify_password};
use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::services::email_service::EmailService;
use crate::user::user_models::User;
use crate::user::user_repository::UserRepository;
use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
    user_repo: UserRepository,
    verification_repo: VerificationRepository,
    email_service: EmailService,
    jwt_secret: String,
    jwt_expiration_hours: i64,
}

impl AuthService {
    pub fn new(
        db: DbPool,
        user_repo: UserRepository,
        verification_repo: VerificationRepository,
        email_service: EmailService,
        jwt_secret: String,
        jwt_expiration_hours: i64,
    ) -> Self {
        Self {
            db,
            user_repo,
            verification_repo,
            email_service,
            jwt_secret,
            jwt_expiration_hours,
        }
    }

    /// Create the account and its verification token atomically, then send
    /// the verification email. Returns the token so development setups
    /// without SMTP can surface it.
    pub async fn register(&self, payload: &RegisterRequest) -> Result<String> {
        if payload.password != payload.confirm_password {
            return Err(AppError::BadRequest("Passwords do not match".to_string()));
        }

        if self.user_repo.find_by_email(&payload.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&payload.password)?;
        let verification_token = Uuid::new_v4().to_string();

        let mut tx = self.db.begin().await?;

        let user = self
            .user_repo
            .create_with_tx(
                &mut tx,
                &payload.email,
                &password_hash,
                &payload.first_name,
                &payload.last_name,
                &payload.university,
                payload.graduation_year,
                payload.major.as_deref(),
            )
            .await?;

        let expires_at = Utc::now() + Duration::hours(24);
        self.verification_repo
            .create_email_verification_with_tx(&mut tx, &verification_token, user.id, expires_at)
            .await?;

        tx.commit().await?;

        self.email_service
            .send_verification_email(&user.email, &user.first_name, &verification_token);

        Ok(verification_token)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !user.email_verified {
            return Err(AppError::Forbidden(
                "Email not verified. Check your inbox for verification link.".to_string(),
            ));
        }

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let token = create_jwt(user.id, &user.email, &self.jwt_secret, self.jwt_expiration_hours)?;

        self.user_repo.touch_last_active(user.id).await?;

        Ok((user, token))
    }

    pub async fn verify_email(&self, token: &str) -> Result<()> {
        let verification = self
            .verification_repo
            .find_valid_verification(token)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("Invalid or expired verification token".to_string())
            })?;

        self.user_repo.set_email_verified(verification.user_id).await?;
        self.verification_repo.delete_verification(token).await?;

        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        if self.user_repo.find_by_email(email).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let otp = generate_otp();
        let expires_at = Utc::now() + Duration::minutes(15);
        self.verification_repo
            .create_password_reset(email, &otp, expires_at)
            .await?;

        self.email_service.send_password_reset_otp(email, &otp);

        Ok(())
    }

    /// Exchanges a valid OTP for a one-shot reset token.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<String> {
        self.verification_repo
            .find_valid_reset(email, otp)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired OTP".to_string()))?;

        self.verification_repo.delete_resets_by_email(email).await?;

        let reset_token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::minutes(15);
        self.verification_repo
            .create_password_reset(email, &reset_token, expires_at)
            .await?;

        Ok(reset_token)
    }

    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<()> {
        let reset = self
            .verification_repo
            .find_valid_reset_by_token(reset_token)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        let password_hash = hash_password(new_password)?;
        self.user_repo
            .update_password_by_email(&reset.email, &password_hash)
            .await?;
        self.verification_repo.delete_reset_by_token(reset_token).await?;

        Ok(())
    }

    pub async fn request_email_change(&self, user_id: Uuid, new_email: &str) -> Result<()> {
        if self.user_repo.email_taken_by_other(new_email, user_id).await? {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let verification_token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::hours(24);
        self.verification_repo
            .create_email_verification(&verification_token, user_id, expires_at)
            .await?;

        self.email_service
            .send_email_change_verification(new_email, &verification_token);

        Ok(())
    }

    pub async fn verify_email_change(&self, token: &str, new_email: &str) -> Result<()> {
        let verification = self
            .verification_repo
            .find_valid_verification(token)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("Invalid or expired verification token".to_string())
            })?;

        // The address may have been claimed since the change was requested.
        if self
            .user_repo
            .email_taken_by_other(new_email, verification.user_id)
            .await?
        {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let mut tx = self.db.begin().await?;
        self.user_repo
            .update_email_with_tx(&mut tx, verification.user_id, new_email)
            .await?;
        self.verification_repo
            .delete_verification_with_tx(&mut tx, token)
            .await?;
        tx.commit().await?;

        Ok(())
    }
}

fn generate_otp() -> String {
    let otp: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    otp.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[test]
    fn test_otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    async fn seed_user(pool: &PgPool, email: &str) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO users (email, password_hash, first_name, last_name, university)
             VALUES ($1, 'hash', 'Test', 'User', 'State')
             RETURNING id",
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn service(pool: PgPool) -> AuthService {
        AuthService::new(
            pool.clone(),
            UserRepository::new(pool.clone()),
            VerificationRepository::new(pool),
            EmailService::new("http://localhost:5173".to_string()),
            "test-secret".to_string(),
            24,
        )
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_email_change_conflicts_when_address_claimed_after_request(pool: PgPool) {
        let service = service(pool.clone());
        let user_id = seed_user(&pool, "alice@state.edu").await;
        seed_user(&pool, "taken@state.edu").await;

        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::hours(24);
        service
            .verification_repo
            .create_email_verification(&token, user_id, expires_at)
            .await
            .unwrap();

        let err = service
            .verify_email_change(&token, "taken@state.edu")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // The original address is untouched and the token stays usable.
        let email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(email, "alice@state.edu");

        service
            .verify_email_change(&token, "alice.new@state.edu")
            .await
            .unwrap();
        let email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(email, "alice.new@state.edu");
    }
}
