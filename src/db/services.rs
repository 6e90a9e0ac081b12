//! High-level business logic functions.
//!
//! These functions sit between the HTTP handlers and the repository traits.
//! They validate input, enforce business rules, and delegate persistence to
//! whichever repository backend is active. Handlers should call these
//! functions rather than the repository directly so that validation cannot
//! be bypassed.

use crate::api::{
    Address, Category, CategoryId, DashboardStats, NewAddress, NewOrder, NewProduct, NewUser,
    Notification, NotificationId, Order, OrderId, OrderStatus, Product, ProductFilter, ProductId,
    StockPolicy, User, UserId, UserRecord,
};
use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};

// ==================== Health ====================

/// Check that the backing store is reachable.
pub async fn health_check(repo: &dyn FullRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Catalog ====================

/// List products matching the filter.
pub async fn list_products(
    repo: &dyn FullRepository,
    filter: &ProductFilter,
) -> RepositoryResult<Vec<Product>> {
    repo.list_products(filter).await
}

/// Fetch a single product.
pub async fn get_product(repo: &dyn FullRepository, id: ProductId) -> RepositoryResult<Product> {
    repo.get_product(id).await
}

/// List products belonging to a category.
pub async fn list_products_by_category(
    repo: &dyn FullRepository,
    category_id: CategoryId,
) -> RepositoryResult<Vec<Product>> {
    repo.list_products_by_category(category_id).await
}

/// List every product with its category, newest first.
///
/// Used by the admin catalog view, where products are shown with the
/// category they belong to.
pub async fn list_products_with_categories(
    repo: &dyn FullRepository,
) -> RepositoryResult<Vec<(Product, Option<Category>)>> {
    repo.list_products_with_categories().await
}

/// Validate and create a product.
///
/// # Errors
/// Returns `ValidationError` when the name is empty, the price is not
/// positive, the stock is negative, or the category does not exist.
pub async fn create_product(
    repo: &dyn FullRepository,
    product: &NewProduct,
) -> RepositoryResult<Product> {
    validate_product(repo, product).await?;
    repo.create_product(product).await
}

/// Validate and update a product.
///
/// The same rules as [`create_product`] apply. An unknown product id yields
/// `NotFound`.
pub async fn update_product(
    repo: &dyn FullRepository,
    id: ProductId,
    product: &NewProduct,
) -> RepositoryResult<Product> {
    validate_product(repo, product).await?;
    repo.update_product(id, product).await
}

/// Delete a product. An unknown id yields `NotFound`.
pub async fn delete_product(repo: &dyn FullRepository, id: ProductId) -> RepositoryResult<()> {
    repo.delete_product(id).await
}

/// List all categories.
pub async fn list_categories(repo: &dyn FullRepository) -> RepositoryResult<Vec<Category>> {
    repo.list_categories().await
}

/// Fetch a single category.
pub async fn get_category(repo: &dyn FullRepository, id: CategoryId) -> RepositoryResult<Category> {
    repo.get_category(id).await
}

async fn validate_product(repo: &dyn FullRepository, product: &NewProduct) -> RepositoryResult<()> {
    if product.name.trim().is_empty() {
        return Err(RepositoryError::validation("Product name is required"));
    }
    if product.price <= 0.0 || !product.price.is_finite() {
        return Err(RepositoryError::validation(
            "Product price must be greater than zero",
        ));
    }
    if product.stock < 0 {
        return Err(RepositoryError::validation(
            "Product stock cannot be negative",
        ));
    }

    // The category must exist before a product can reference it.
    match repo.get_category(product.category_id).await {
        Ok(_) => Ok(()),
        Err(RepositoryError::NotFound { .. }) => {
            Err(RepositoryError::validation("Invalid category ID"))
        }
        Err(e) => Err(e),
    }
}

// ==================== Orders ====================

/// Validate and atomically place an order.
///
/// The order total is computed from current catalog prices inside the
/// repository transaction; client-supplied totals are never trusted.
///
/// # Errors
/// * `ValidationError` - missing customer fields, empty item list,
///   non-positive quantity, or insufficient stock under
///   [`StockPolicy::Reject`]
/// * `NotFound` - an item referenced a missing product
pub async fn place_order(
    repo: &dyn FullRepository,
    order: &NewOrder,
    policy: StockPolicy,
) -> RepositoryResult<Order> {
    if order.customer_name.trim().is_empty() {
        return Err(RepositoryError::validation("Customer name is required"));
    }
    if order.customer_email.trim().is_empty() {
        return Err(RepositoryError::validation("Customer email is required"));
    }
    if order.items.is_empty() {
        return Err(RepositoryError::validation(
            "Order must contain at least one item",
        ));
    }
    for item in &order.items {
        if item.quantity <= 0 {
            return Err(RepositoryError::validation(format!(
                "Quantity for product {} must be positive",
                item.product_id
            )));
        }
    }

    repo.place_order(order, policy).await
}

/// Fetch an order with its items.
pub async fn get_order(repo: &dyn FullRepository, id: OrderId) -> RepositoryResult<Order> {
    repo.get_order(id).await
}

/// List orders, newest first, optionally filtered by status.
pub async fn list_orders(
    repo: &dyn FullRepository,
    status: Option<OrderStatus>,
) -> RepositoryResult<Vec<Order>> {
    repo.list_orders(status).await
}

/// Overwrite an order's status. An unknown id yields `NotFound`.
pub async fn update_order_status(
    repo: &dyn FullRepository,
    id: OrderId,
    status: OrderStatus,
) -> RepositoryResult<()> {
    repo.update_order_status(id, status).await
}

/// Fetch an order together with the product names of its items.
///
/// Used by the admin order-details view, where item rows are displayed with
/// the product name rather than just its id.
pub async fn order_details(
    repo: &dyn FullRepository,
    id: OrderId,
) -> RepositoryResult<(Order, Vec<(ProductId, String)>)> {
    let order = repo.get_order(id).await?;
    let names = repo.order_item_product_names(id).await?;
    Ok((order, names))
}

/// Aggregate counters for the admin dashboard.
pub async fn dashboard_stats(repo: &dyn FullRepository) -> RepositoryResult<DashboardStats> {
    repo.dashboard_stats().await
}

// ==================== Accounts ====================

/// Look up a user by email, including credential fields.
pub async fn find_user_by_email(
    repo: &dyn FullRepository,
    email: &str,
) -> RepositoryResult<Option<UserRecord>> {
    repo.find_user_by_email(email).await
}

/// Validate and create a user account.
///
/// The password must already be hashed by the caller; this layer never sees
/// plaintext credentials.
///
/// # Errors
/// `ValidationError` when the email is malformed, the name is empty, or the
/// email is already registered.
pub async fn register_user(repo: &dyn FullRepository, user: &NewUser) -> RepositoryResult<User> {
    if user.email.trim().is_empty() || !user.email.contains('@') {
        return Err(RepositoryError::validation("A valid email is required"));
    }
    if user.full_name.trim().is_empty() {
        return Err(RepositoryError::validation("Full name is required"));
    }

    if repo.find_user_by_email(&user.email).await?.is_some() {
        return Err(RepositoryError::validation("Email already registered"));
    }

    repo.create_user(user).await
}

/// Overwrite the password hash for the given email.
pub async fn reset_password(
    repo: &dyn FullRepository,
    email: &str,
    password_hash: &str,
) -> RepositoryResult<()> {
    repo.update_password(email, password_hash).await
}

/// Validate and update a user's profile fields.
pub async fn update_profile(
    repo: &dyn FullRepository,
    id: UserId,
    full_name: &str,
    phone: &str,
) -> RepositoryResult<User> {
    if full_name.trim().is_empty() {
        return Err(RepositoryError::validation("Full name is required"));
    }
    repo.update_profile(id, full_name, phone).await
}

/// List a user's addresses, default first.
pub async fn list_addresses(
    repo: &dyn FullRepository,
    user_id: UserId,
) -> RepositoryResult<Vec<Address>> {
    repo.list_addresses(user_id).await
}

/// Validate and create an address for a user.
pub async fn create_address(
    repo: &dyn FullRepository,
    user_id: UserId,
    address: &NewAddress,
) -> RepositoryResult<Address> {
    if address.street.trim().is_empty() {
        return Err(RepositoryError::validation("Street is required"));
    }
    if address.city.trim().is_empty() {
        return Err(RepositoryError::validation("City is required"));
    }
    repo.create_address(user_id, address).await
}

/// List a user's notifications, newest first.
pub async fn list_notifications(
    repo: &dyn FullRepository,
    user_id: UserId,
) -> RepositoryResult<Vec<Notification>> {
    repo.list_notifications(user_id).await
}

/// Mark one of the user's notifications as read.
pub async fn mark_notification_read(
    repo: &dyn FullRepository,
    user_id: UserId,
    notification_id: NotificationId,
) -> RepositoryResult<Notification> {
    repo.mark_notification_read(user_id, notification_id).await
}
