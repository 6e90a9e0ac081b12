//! Authentication handlers: login, registration, and password reset.
//!
//! Passwords are hashed with bcrypt. Hashing and verification are CPU-bound,
//! so both run under `spawn_blocking` to keep the async executor responsive.
//! Login failures always return the same message regardless of whether the
//! email exists, so account presence cannot be probed.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bcrypt::DEFAULT_COST;

use super::HandlerResult;
use crate::api::{NewUser, User};
use crate::db::services as db_services;
use crate::http::dto::{Envelope, LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::http::error::AppError;
use crate::http::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// POST /api/auth/login
///
/// Verify credentials and return the user profile.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> HandlerResult<User> {
    let record = db_services::find_user_by_email(state.repository.as_ref(), &request.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = verify_password(request.password, record.password_hash.clone()).await?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }
    if !record.is_active {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    Ok(Json(Envelope::with_message(
        record.profile(),
        "Login successful",
    )))
}

/// POST /api/auth/register
///
/// Create a new customer account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Envelope<User>>), AppError> {
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash = hash_password(request.password).await?;
    let user = db_services::register_user(
        state.repository.as_ref(),
        &NewUser {
            email: request.email,
            password_hash,
            full_name: request.full_name,
            phone: request.phone,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(user, "Account created")),
    ))
}

/// POST /api/auth/reset-password
///
/// Overwrite the password for an existing account.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> HandlerResult<()> {
    if request.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash = hash_password(request.new_password).await?;
    db_services::reset_password(state.repository.as_ref(), &request.email, &password_hash).await?;

    Ok(Json(Envelope::message("Password updated")))
}
