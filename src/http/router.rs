//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing,
//! admin gating), and creates the axum router ready for serving.
//!
//! Write access to the catalog, the status update, and the `/api/admin/*`
//! views require the request header `X-User-Role: admin`. Read endpoints,
//! order placement, and auth are public.

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::error::AppError;
use super::handlers;
use super::state::AppState;

/// Reject requests that do not carry the admin role header.
async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let is_admin = request
        .headers()
        .get("x-user-role")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|role| role.eq_ignore_ascii_case("admin"));

    if !is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(next.run(request).await)
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin_gate = middleware::from_fn(require_admin);

    let api = Router::new()
        // Catalog
        .route(
            "/products",
            get(handlers::list_products)
                .merge(post(handlers::create_product).route_layer(admin_gate.clone())),
        )
        .route(
            "/products/{id}",
            get(handlers::get_product).merge(
                put(handlers::update_product)
                    .delete(handlers::delete_product)
                    .route_layer(admin_gate.clone()),
            ),
        )
        .route(
            "/products/category/{category_id}",
            get(handlers::list_products_by_category),
        )
        .route("/categories", get(handlers::list_categories))
        .route("/categories/{id}", get(handlers::get_category))
        // Orders
        .route(
            "/orders",
            get(handlers::list_orders).post(handlers::create_order),
        )
        .route("/orders/{id}", get(handlers::get_order))
        .route(
            "/orders/{id}/status",
            put(handlers::update_order_status).route_layer(admin_gate.clone()),
        )
        // Auth
        .route("/auth/login", post(handlers::login))
        .route("/auth/register", post(handlers::register))
        .route("/auth/reset-password", post(handlers::reset_password))
        // Accounts
        .route(
            "/users/{id}/addresses",
            get(handlers::list_addresses).post(handlers::create_address),
        )
        .route(
            "/users/{id}/notifications",
            get(handlers::list_notifications),
        )
        .route(
            "/users/{id}/notifications/{notification_id}/read",
            put(handlers::mark_notification_read),
        )
        .route("/users/{id}/profile", put(handlers::update_profile))
        // Admin views
        .route(
            "/admin/products",
            get(handlers::admin_list_products).route_layer(admin_gate.clone()),
        )
        .route(
            "/admin/orders",
            get(handlers::admin_list_orders).route_layer(admin_gate.clone()),
        )
        .route(
            "/admin/orders/{id}",
            get(handlers::admin_get_order).route_layer(admin_gate.clone()),
        )
        .route(
            "/admin/stats",
            get(handlers::admin_stats).route_layer(admin_gate),
        );

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
