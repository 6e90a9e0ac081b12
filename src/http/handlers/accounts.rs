//! Account handlers: addresses, notifications, and profile updates.
//!
//! All of these endpoints are scoped to the user id in the path; a user's
//! addresses and notifications are never visible under another user's id.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::HandlerResult;
use crate::api::{Address, NewAddress, Notification, NotificationId, User, UserId};
use crate::db::services as db_services;
use crate::http::dto::{Envelope, UpdateProfileRequest};
use crate::http::error::AppError;
use crate::http::state::AppState;

/// GET /api/users/{id}/addresses
pub async fn list_addresses(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> HandlerResult<Vec<Address>> {
    let addresses =
        db_services::list_addresses(state.repository.as_ref(), UserId::new(user_id)).await?;
    Ok(Json(Envelope::data(addresses)))
}

/// POST /api/users/{id}/addresses
pub async fn create_address(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<NewAddress>,
) -> Result<(StatusCode, Json<Envelope<Address>>), AppError> {
    let address =
        db_services::create_address(state.repository.as_ref(), UserId::new(user_id), &request)
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(address, "Address saved")),
    ))
}

/// GET /api/users/{id}/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> HandlerResult<Vec<Notification>> {
    let notifications =
        db_services::list_notifications(state.repository.as_ref(), UserId::new(user_id)).await?;
    Ok(Json(Envelope::data(notifications)))
}

/// PUT /api/users/{id}/notifications/{notification_id}/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path((user_id, notification_id)): Path<(i64, i64)>,
) -> HandlerResult<Notification> {
    let notification = db_services::mark_notification_read(
        state.repository.as_ref(),
        UserId::new(user_id),
        NotificationId::new(notification_id),
    )
    .await?;
    Ok(Json(Envelope::data(notification)))
}

/// PUT /api/users/{id}/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateProfileRequest>,
) -> HandlerResult<User> {
    let user = db_services::update_profile(
        state.repository.as_ref(),
        UserId::new(user_id),
        &request.full_name,
        &request.phone,
    )
    .await?;
    Ok(Json(Envelope::with_message(user, "Profile updated")))
}
