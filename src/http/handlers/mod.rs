//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic. Handlers are grouped by resource.

use axum::extract::State;
use axum::Json;

use super::dto::{Envelope, HealthResponse};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod categories;
pub mod orders;
pub mod products;

pub use accounts::{
    create_address, list_addresses, list_notifications, mark_notification_read, update_profile,
};
pub use admin::{
    admin_get_order, admin_list_orders, admin_list_products, admin_stats, update_order_status,
};
pub use auth::{login, register, reset_password};
pub use categories::{get_category, list_categories};
pub use orders::{create_order, get_order, list_orders};
pub use products::{
    create_product, delete_product, get_product, list_products, list_products_by_category,
    update_product,
};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<Envelope<T>>, AppError>;

/// GET /health
///
/// Health check endpoint to verify the service is running and the database
/// is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(Envelope::data(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    })))
}
