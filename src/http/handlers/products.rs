//! Product catalog handlers.
//!
//! Reads are public; the write endpoints are attached to the admin-gated
//! subrouter in `router.rs`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::HandlerResult;
use crate::api::{CategoryId, NewProduct, Product, ProductId};
use crate::db::services as db_services;
use crate::http::dto::{Envelope, ProductQuery};
use crate::http::error::AppError;
use crate::http::state::AppState;

/// GET /api/products
///
/// List products, optionally filtered by search string and price range.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> HandlerResult<Vec<Product>> {
    let products = db_services::list_products(state.repository.as_ref(), &query.into()).await?;
    Ok(Json(Envelope::data(products)))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Product> {
    let product = db_services::get_product(state.repository.as_ref(), ProductId::new(id)).await?;
    Ok(Json(Envelope::data(product)))
}

/// GET /api/products/category/{category_id}
pub async fn list_products_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> HandlerResult<Vec<Product>> {
    // Listing products of an unknown category yields 404 rather than an
    // empty list.
    let category_id = CategoryId::new(category_id);
    db_services::get_category(state.repository.as_ref(), category_id).await?;
    let products =
        db_services::list_products_by_category(state.repository.as_ref(), category_id).await?;
    Ok(Json(Envelope::data(products)))
}

/// POST /api/products (admin)
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<NewProduct>,
) -> Result<(StatusCode, Json<Envelope<Product>>), AppError> {
    let product = db_services::create_product(state.repository.as_ref(), &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(product, "Product created")),
    ))
}

/// PUT /api/products/{id} (admin)
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<NewProduct>,
) -> HandlerResult<Product> {
    let product =
        db_services::update_product(state.repository.as_ref(), ProductId::new(id), &request)
            .await?;
    Ok(Json(Envelope::with_message(product, "Product updated")))
}

/// DELETE /api/products/{id} (admin)
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<()> {
    db_services::delete_product(state.repository.as_ref(), ProductId::new(id)).await?;
    Ok(Json(Envelope::message("Product deleted")))
}
