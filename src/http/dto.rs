//! Data Transfer Objects for the HTTP API.
//!
//! These DTOs are used for request/response serialization in the REST API.
//! Domain types from `crate::api` already derive Serialize/Deserialize and
//! are re-exported here; this module adds the response envelope, request
//! bodies, and query parameter types.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    Address, Category, DashboardStats, NewAddress, Notification, Order, OrderItem, Product, User,
};
use crate::api::{NewOrder, NewOrderItem, OrderId, ProductFilter, ProductId, UserId};

/// Uniform response envelope wrapped around every endpoint's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Payload, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Optional human-readable message on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error message, present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Successful response carrying data.
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Successful response carrying data and a message.
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
        }
    }
}

impl Envelope<()> {
    /// Successful response carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    /// Failed response carrying an error message.
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Request body for login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for account registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
}

/// Request body for password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

// =============================================================================
// Orders
// =============================================================================

/// One requested line of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

/// Request body for order placement.
///
/// The total is never accepted from the client; it is computed from current
/// catalog prices when the order is placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    pub items: Vec<OrderItemRequest>,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(req: CreateOrderRequest) -> Self {
        NewOrder {
            user_id: req.user_id.map(UserId::new),
            customer_name: req.customer_name,
            customer_email: req.customer_email,
            customer_phone: req.customer_phone,
            items: req
                .items
                .into_iter()
                .map(|item| NewOrderItem {
                    product_id: ProductId::new(item.product_id),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

/// Request body for the admin status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Query parameters for order listings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderQuery {
    /// Filter by status ("pending", "processing", "completed", "cancelled")
    #[serde(default)]
    pub status: Option<String>,
}

/// Order line enriched with the product name, for the admin details view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOrderItemDto {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub price: f64,
}

/// Full order representation for the admin details view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOrderDto {
    pub id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub total_amount: f64,
    pub status: crate::api::OrderStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub items: Vec<AdminOrderItemDto>,
}

impl AdminOrderDto {
    /// Join an order with the product names of its items.
    pub fn from_parts(order: Order, names: Vec<(ProductId, String)>) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| AdminOrderItemDto {
                product_id: item.product_id.value(),
                product_name: names
                    .iter()
                    .find(|(id, _)| *id == item.product_id)
                    .map(|(_, name)| name.clone())
                    .unwrap_or_default(),
                quantity: item.quantity,
                price: item.price,
            })
            .collect();
        Self {
            id: order.id,
            user_id: order.user_id,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            total_amount: order.total_amount,
            status: order.status,
            created_at: order.created_at,
            items,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product with its category embedded, for the admin catalog view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminProductDto {
    #[serde(flatten)]
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// Query parameters for the product listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductQuery {
    /// Substring match over name and description
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        ProductFilter {
            search: query.search.filter(|s| !s.trim().is_empty()),
            min_price: query.min_price,
            max_price: query.max_price,
        }
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// Request body for profile updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
}

// =============================================================================
// Health
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}
