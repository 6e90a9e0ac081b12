//! Repository trait definitions.
//!
//! The traits in this module abstract the storage backend so that handlers
//! and services can run against either the in-memory `LocalRepository` or
//! the Diesel-backed `PostgresRepository`.

use async_trait::async_trait;

use crate::api::{
    Address, AddressId, Category, CategoryId, DashboardStats, NewAddress, NewOrder, NewProduct,
    NewUser, Notification, NotificationId, Order, OrderId, OrderStatus, Product, ProductFilter,
    ProductId, StockPolicy, User, UserId, UserRecord,
};

mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Repository trait for catalog operations (products and categories).
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// List products matching the filter, ordered by name.
    async fn list_products(&self, filter: &ProductFilter) -> RepositoryResult<Vec<Product>>;

    /// Fetch a single product.
    ///
    /// # Returns
    /// * `Ok(Product)` on success
    /// * `Err(RepositoryError::NotFound)` when the id is unknown
    async fn get_product(&self, id: ProductId) -> RepositoryResult<Product>;

    /// List products in a category, ordered by name.
    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> RepositoryResult<Vec<Product>>;

    /// List every product with its category, newest first.
    /// Used by the admin catalog view.
    async fn list_products_with_categories(
        &self,
    ) -> RepositoryResult<Vec<(Product, Option<Category>)>>;

    /// Insert a product and return it with its assigned id.
    async fn create_product(&self, product: &NewProduct) -> RepositoryResult<Product>;

    /// Replace a product's mutable fields.
    async fn update_product(&self, id: ProductId, product: &NewProduct)
        -> RepositoryResult<Product>;

    /// Delete a product. Unknown ids yield `NotFound`.
    async fn delete_product(&self, id: ProductId) -> RepositoryResult<()>;

    /// List all categories, ordered by name.
    async fn list_categories(&self) -> RepositoryResult<Vec<Category>>;

    /// Fetch a single category.
    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Category>;
}

/// Repository trait for order operations.
///
/// Order placement is the only multi-statement operation in the system and
/// must be atomic: either the order row, all item rows, and every stock
/// decrement are persisted, or none of them are.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Atomically place an order.
    ///
    /// Computes the total from current catalog prices, inserts the order
    /// with status `pending`, inserts one item row per line (price re-read
    /// inside the transaction), and decrements stock per product.
    ///
    /// Under [`StockPolicy::Reject`] a decrement that would drive stock
    /// negative fails the whole order with a validation error. Under
    /// [`StockPolicy::AllowNegative`] the decrement is unconditional.
    ///
    /// # Returns
    /// * `Ok(Order)` - the persisted order including items
    /// * `Err(RepositoryError::NotFound)` - an item referenced a missing product
    /// * `Err(RepositoryError::ValidationError)` - insufficient stock
    async fn place_order(&self, order: &NewOrder, policy: StockPolicy)
        -> RepositoryResult<Order>;

    /// Fetch an order with its items.
    async fn get_order(&self, id: OrderId) -> RepositoryResult<Order>;

    /// List orders without items, newest first, optionally filtered by status.
    async fn list_orders(&self, status: Option<OrderStatus>) -> RepositoryResult<Vec<Order>>;

    /// Overwrite an order's status. Zero affected rows yield `NotFound`.
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> RepositoryResult<()>;

    /// Product names for the items of an order, keyed by product id.
    /// Used by the admin order-details view.
    async fn order_item_product_names(
        &self,
        id: OrderId,
    ) -> RepositoryResult<Vec<(ProductId, String)>>;

    /// Aggregate counters for the admin dashboard.
    async fn dashboard_stats(&self) -> RepositoryResult<DashboardStats>;
}

/// Repository trait for user accounts, addresses, and notifications.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Look up a user by email, including credential fields.
    ///
    /// Returns `Ok(None)` for an unknown email so callers can produce a
    /// generic credentials error without leaking user existence.
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<UserRecord>>;

    /// Create a user account. A duplicate email yields a validation error.
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User>;

    /// Overwrite the password hash for the given email.
    /// Zero affected rows yield `NotFound`.
    async fn update_password(&self, email: &str, password_hash: &str) -> RepositoryResult<()>;

    /// Update a user's profile fields and return the fresh profile.
    async fn update_profile(
        &self,
        id: UserId,
        full_name: &str,
        phone: &str,
    ) -> RepositoryResult<User>;

    /// List a user's addresses, default first, then newest first.
    async fn list_addresses(&self, user_id: UserId) -> RepositoryResult<Vec<Address>>;

    /// Create an address. When the new address is the default, the previous
    /// default is cleared in the same transaction.
    async fn create_address(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> RepositoryResult<Address>;

    /// List a user's notifications, newest first.
    async fn list_notifications(&self, user_id: UserId) -> RepositoryResult<Vec<Notification>>;

    /// Mark a notification read. Idempotent: repeating the call leaves state
    /// unchanged and succeeds. Unknown ids yield `NotFound`.
    async fn mark_notification_read(
        &self,
        user_id: UserId,
        notification_id: NotificationId,
    ) -> RepositoryResult<Notification>;
}

/// Combined repository interface used by handlers and services.
pub trait FullRepository: CatalogRepository + OrderRepository + AccountRepository {}

impl<T: CatalogRepository + OrderRepository + AccountRepository> FullRepository for T {}
