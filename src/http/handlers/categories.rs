//! Category handlers. All category endpoints are read-only.

use axum::extract::{Path, State};
use axum::Json;

use super::HandlerResult;
use crate::api::{Category, CategoryId};
use crate::db::services as db_services;
use crate::http::dto::Envelope;
use crate::http::state::AppState;

/// GET /api/categories
pub async fn list_categories(State(state): State<AppState>) -> HandlerResult<Vec<Category>> {
    let categories = db_services::list_categories(state.repository.as_ref()).await?;
    Ok(Json(Envelope::data(categories)))
}

/// GET /api/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Category> {
    let category =
        db_services::get_category(state.repository.as_ref(), CategoryId::new(id)).await?;
    Ok(Json(Envelope::data(category)))
}
