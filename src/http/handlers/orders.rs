//! Order handlers.
//!
//! Order placement is the only transactional flow in the system. The total
//! is computed server-side from current catalog prices and the stock of each
//! ordered product is decremented in the same transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::HandlerResult;
use crate::api::{Order, OrderId, OrderStatus};
use crate::db::services as db_services;
use crate::http::dto::{CreateOrderRequest, Envelope, OrderQuery};
use crate::http::error::AppError;
use crate::http::state::AppState;

pub(super) fn parse_status(status: &str) -> Result<OrderStatus, AppError> {
    status.parse().map_err(AppError::BadRequest)
}

/// POST /api/orders
///
/// Place an order.
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Envelope<Order>>), AppError> {
    let order = db_services::place_order(
        state.repository.as_ref(),
        &request.into(),
        state.stock_policy,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(order, "Order placed successfully")),
    ))
}

/// GET /api/orders
///
/// List orders, newest first, optionally filtered by status.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> HandlerResult<Vec<Order>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let orders = db_services::list_orders(state.repository.as_ref(), status).await?;
    Ok(Json(Envelope::data(orders)))
}

/// GET /api/orders/{id}
///
/// Fetch a single order with its items.
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Order> {
    let order = db_services::get_order(state.repository.as_ref(), OrderId::new(id)).await?;
    Ok(Json(Envelope::data(order)))
}
