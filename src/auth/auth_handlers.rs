use super::auth_dto::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, RegisterResponse,
    ResetPasswordRequest, UpdateEmailRequest, VerifyOtpRequest, VerifyOtpResponse,
};
use crate::{
    error::{AppError, Result},
    middleware::AuthUser,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let verification_token = state.auth_service.register(&payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful! Check your email for verification link.".to_string(),
            token: verification_token,
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Email not verified")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let (user, token) = state.auth_service.login(&payload.email, &payload.password).await?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

// ... (verify_email)
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    state.auth_service.verify_email(&token).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Email verified successfully! You can now login."
    })))
}

// ... (forgot_password)
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    state.auth_service.forgot_password(&payload.email).await?;

    Ok(Json(json!({ "success": true, "message": "OTP sent to your email" })))
}

// ... (verify_otp)
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let reset_token = state
        .auth_service
        .verify_otp(&payload.email, &payload.otp)
        .await?;

    Ok(Json(VerifyOtpResponse { reset_token }))
}

// ... (reset_password)
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    state
        .auth_service
        .reset_password(&payload.reset_token, &payload.new_password)
        .await?;

    Ok(Json(json!({ "success": true, "message": "Password reset successfully" })))
}

// ... (update_email)
pub async fn update_email(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateEmailRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    state
        .auth_service
        .request_email_change(user_id, &payload.email)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Verification email sent to new email address"
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailChangeQuery {
    new_email: Option<String>,
}

// ... (verify_email_change)
pub async fn verify_email_change(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<VerifyEmailChangeQuery>,
) -> Result<impl IntoResponse> {
    let new_email = query
        .new_email
        .ok_or_else(|| AppError::BadRequest("New email required".to_string()))?;

    state.auth_service.verify_email_change(&token, &new_email).await?;

    Ok(Json(json!({ "success": true, "message": "Email updated successfully" })))
}
