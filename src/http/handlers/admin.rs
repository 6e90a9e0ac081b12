//! Admin handlers. Every route in this module sits behind the admin gate
//! configured in `router.rs`.

use axum::extract::{Path, Query, State};
use axum::Json;

use super::orders::parse_status;
use super::HandlerResult;
use crate::api::{DashboardStats, Order, OrderId};
use crate::db::services as db_services;
use crate::http::dto::{AdminOrderDto, AdminProductDto, Envelope, OrderQuery, UpdateStatusRequest};
use crate::http::state::AppState;

/// PUT /api/orders/{id}/status
///
/// Overwrite an order's status. Any of the four statuses may be set at any
/// time; there is no transition graph.
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> HandlerResult<()> {
    let status = parse_status(&request.status)?;
    db_services::update_order_status(state.repository.as_ref(), OrderId::new(id), status).await?;
    Ok(Json(Envelope::message("Order status updated")))
}

/// GET /api/admin/products
///
/// Every product, newest first, with its category embedded.
pub async fn admin_list_products(
    State(state): State<AppState>,
) -> HandlerResult<Vec<AdminProductDto>> {
    let rows = db_services::list_products_with_categories(state.repository.as_ref()).await?;
    Ok(Json(Envelope::data(
        rows.into_iter()
            .map(|(product, category)| AdminProductDto { product, category })
            .collect(),
    )))
}

/// GET /api/admin/orders
pub async fn admin_list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> HandlerResult<Vec<Order>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let orders = db_services::list_orders(state.repository.as_ref(), status).await?;
    Ok(Json(Envelope::data(orders)))
}

/// GET /api/admin/orders/{id}
///
/// Order details with product names resolved for each item.
pub async fn admin_get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<AdminOrderDto> {
    let (order, names) =
        db_services::order_details(state.repository.as_ref(), OrderId::new(id)).await?;
    Ok(Json(Envelope::data(AdminOrderDto::from_parts(order, names))))
}

/// GET /api/admin/stats
pub async fn admin_stats(State(state): State<AppState>) -> HandlerResult<DashboardStats> {
    let stats = db_services::dashboard_stats(state.repository.as_ref()).await?;
    Ok(Json(Envelope::data(stats)))
}
