//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::dsl::sum;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task;

use crate::api::{
    round_currency, Address, Category, CategoryId, DashboardStats, NewAddress, NewOrder,
    NewOrderItem, NewProduct, NewUser, Notification, NotificationId, Order, OrderId, OrderItem,
    OrderStatus, Product, ProductFilter, ProductId, StockPolicy, User, UserId, UserRecord,
};
use crate::db::repository::{
    AccountRepository, CatalogRepository, ErrorContext, OrderRepository, RepositoryError,
    RepositoryResult,
};

mod models;
mod schema;

use models::*;
use schema::{addresses, categories, notifications, order_items, orders, products, users};

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let env_u32 = |key: &str, default: u32| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(default)
        };
        let env_u64 = |key: &str, default: u64| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            database_url,
            max_pool_size: env_u32("PG_POOL_MAX", 10),
            min_pool_size: env_u32("PG_POOL_MIN", 1),
            connection_timeout_sec: env_u64("PG_CONN_TIMEOUT_SEC", 30),
            idle_timeout_sec: env_u64("PG_IDLE_TIMEOUT_SEC", 600),
            max_retries: env_u32("PG_MAX_RETRIES", 3),
            retry_delay_ms: env_u64("PG_RETRY_DELAY_MS", 100),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times when a retryable error occurs
    /// (connection errors, serialization failures), with exponential backoff.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn load_products<F>(conn: &mut PgConnection, build: F) -> RepositoryResult<Vec<Product>>
where
    F: FnOnce() -> products::BoxedQuery<'static, diesel::pg::Pg>,
{
    let rows: Vec<ProductRow> = build()
        .select(ProductRow::as_select())
        .load(conn)
        .map_err(map_diesel_error)?;
    Ok(rows.into_iter().map(Product::from).collect())
}

/// Look up a product's current price inside the given connection.
fn product_price(conn: &mut PgConnection, product_id: ProductId) -> RepositoryResult<f64> {
    products::table
        .filter(products::id.eq(product_id.value()))
        .select(products::price)
        .first::<f64>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Invalid product ID",
                ErrorContext::new("place_order")
                    .with_entity("product")
                    .with_entity_id(product_id),
            )
        })
}

/// Decrement stock for one order line under the given policy.
fn decrement_stock(
    conn: &mut PgConnection,
    item: &NewOrderItem,
    policy: StockPolicy,
) -> RepositoryResult<()> {
    let affected = match policy {
        StockPolicy::Reject => diesel::update(
            products::table
                .filter(products::id.eq(item.product_id.value()))
                .filter(products::stock.ge(item.quantity)),
        )
        .set(products::stock.eq(products::stock - item.quantity))
        .execute(conn)
        .map_err(map_diesel_error)?,
        StockPolicy::AllowNegative => diesel::update(
            products::table.filter(products::id.eq(item.product_id.value())),
        )
        .set(products::stock.eq(products::stock - item.quantity))
        .execute(conn)
        .map_err(map_diesel_error)?,
    };

    if affected == 0 {
        // The product exists (its price was read moments ago), so the guard
        // on the stock column is what rejected the update.
        return Err(RepositoryError::validation_with_context(
            format!("Insufficient stock for product {}", item.product_id),
            ErrorContext::new("place_order")
                .with_entity("product")
                .with_entity_id(item.product_id)
                .with_details(format!("requested={}", item.quantity)),
        ));
    }
    Ok(())
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_products(&self, filter: &ProductFilter) -> RepositoryResult<Vec<Product>> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            load_products(conn, move || {
                let mut query = products::table.into_boxed();
                if let Some(search) = filter.search {
                    let pattern = format!("%{}%", search);
                    query = query.filter(
                        products::name
                            .ilike(pattern.clone())
                            .or(products::description.ilike(pattern)),
                    );
                }
                if let Some(min) = filter.min_price {
                    query = query.filter(products::price.ge(min));
                }
                if let Some(max) = filter.max_price {
                    query = query.filter(products::price.le(max));
                }
                query.order(products::name.asc())
            })
        })
        .await
    }

    async fn get_product(&self, id: ProductId) -> RepositoryResult<Product> {
        self.with_conn(move |conn| {
            let row: Option<ProductRow> = products::table
                .filter(products::id.eq(id.value()))
                .select(ProductRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?;
            row.map(Product::from).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "Product not found",
                    ErrorContext::new("get_product")
                        .with_entity("product")
                        .with_entity_id(id),
                )
            })
        })
        .await
    }

    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> RepositoryResult<Vec<Product>> {
        self.with_conn(move |conn| {
            load_products(conn, move || {
                products::table
                    .into_boxed()
                    .filter(products::category_id.eq(category_id.value()))
                    .order(products::name.asc())
            })
        })
        .await
    }

    async fn list_products_with_categories(
        &self,
    ) -> RepositoryResult<Vec<(Product, Option<Category>)>> {
        self.with_conn(|conn| {
            let rows: Vec<(ProductRow, Option<CategoryRow>)> = products::table
                .left_join(categories::table)
                .order(products::created_at.desc())
                .select((ProductRow::as_select(), Option::<CategoryRow>::as_select()))
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .map(|(product, category)| (Product::from(product), category.map(Category::from)))
                .collect())
        })
        .await
    }

    async fn create_product(&self, product: &NewProduct) -> RepositoryResult<Product> {
        let row = NewProductRow {
            category_id: product.category_id.value(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            image_url: product.image_url.clone(),
        };
        self.with_conn(move |conn| {
            let inserted: ProductRow = diesel::insert_into(products::table)
                .values(&row)
                .returning(ProductRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(inserted.into())
        })
        .await
    }

    async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> RepositoryResult<Product> {
        let row = NewProductRow {
            category_id: product.category_id.value(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            image_url: product.image_url.clone(),
        };
        self.with_conn(move |conn| {
            let updated: Option<ProductRow> =
                diesel::update(products::table.filter(products::id.eq(id.value())))
                    .set(&row)
                    .returning(ProductRow::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(map_diesel_error)?;
            updated.map(Product::from).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "Product not found",
                    ErrorContext::new("update_product")
                        .with_entity("product")
                        .with_entity_id(id),
                )
            })
        })
        .await
    }

    async fn delete_product(&self, id: ProductId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(products::table.filter(products::id.eq(id.value())))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::not_found_with_context(
                    "Product not found",
                    ErrorContext::new("delete_product")
                        .with_entity("product")
                        .with_entity_id(id),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        self.with_conn(|conn| {
            let rows: Vec<CategoryRow> = categories::table
                .order(categories::name.asc())
                .select(CategoryRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Category::from).collect())
        })
        .await
    }

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Category> {
        self.with_conn(move |conn| {
            let row: Option<CategoryRow> = categories::table
                .filter(categories::id.eq(id.value()))
                .select(CategoryRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?;
            row.map(Category::from).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "Category not found",
                    ErrorContext::new("get_category")
                        .with_entity("category")
                        .with_entity_id(id),
                )
            })
        })
        .await
    }
}

#[async_trait]
impl OrderRepository for PostgresRepository {
    async fn place_order(
        &self,
        order: &NewOrder,
        policy: StockPolicy,
    ) -> RepositoryResult<Order> {
        let order = order.clone();
        self.with_conn(move |conn| {
            // Pre-check: every product must exist; the total is computed from
            // the prices read here.
            let mut total_amount = 0.0;
            for item in &order.items {
                let price = product_price(conn, item.product_id)?;
                total_amount += price * f64::from(item.quantity);
            }
            let total_amount = round_currency(total_amount);

            conn.transaction(|tx| {
                let new_order = NewOrderRow {
                    user_id: order.user_id.map(|id| id.value()),
                    customer_name: order.customer_name.clone(),
                    customer_email: order.customer_email.clone(),
                    customer_phone: order.customer_phone.clone(),
                    total_amount,
                    status: OrderStatus::Pending.as_str().to_string(),
                };

                let inserted: OrderRow = diesel::insert_into(orders::table)
                    .values(&new_order)
                    .returning(OrderRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                let mut items = Vec::with_capacity(order.items.len());
                for item in &order.items {
                    // Re-read the price inside the transaction; the snapshot
                    // stored on the item row must reflect the committed state.
                    let price = product_price(tx, item.product_id)?;

                    let item_row: OrderItemRow = diesel::insert_into(order_items::table)
                        .values(&NewOrderItemRow {
                            order_id: inserted.id,
                            product_id: item.product_id.value(),
                            quantity: item.quantity,
                            price,
                        })
                        .returning(OrderItemRow::as_returning())
                        .get_result(tx)
                        .map_err(map_diesel_error)?;
                    items.push(OrderItem::from(item_row));

                    decrement_stock(tx, item, policy)?;
                }

                let mut placed = inserted.into_order()?;
                placed.items = items;
                Ok(placed)
            })
        })
        .await
    }

    async fn get_order(&self, id: OrderId) -> RepositoryResult<Order> {
        self.with_conn(move |conn| {
            let row: Option<OrderRow> = orders::table
                .filter(orders::id.eq(id.value()))
                .select(OrderRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?;
            let mut order = row
                .ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        "Order not found",
                        ErrorContext::new("get_order")
                            .with_entity("order")
                            .with_entity_id(id),
                    )
                })?
                .into_order()?;

            let item_rows: Vec<OrderItemRow> = order_items::table
                .filter(order_items::order_id.eq(id.value()))
                .order(order_items::id.asc())
                .select(OrderItemRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            order.items = item_rows.into_iter().map(OrderItem::from).collect();
            Ok(order)
        })
        .await
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> RepositoryResult<Vec<Order>> {
        self.with_conn(move |conn| {
            let mut query = orders::table.into_boxed();
            if let Some(status) = status {
                query = query.filter(orders::status.eq(status.as_str()));
            }
            let rows: Vec<OrderRow> = query
                .order(orders::created_at.desc())
                .select(OrderRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(OrderRow::into_order).collect()
        })
        .await
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let affected = diesel::update(orders::table.filter(orders::id.eq(id.value())))
                .set(orders::status.eq(status.as_str()))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if affected == 0 {
                return Err(RepositoryError::not_found_with_context(
                    "Order not found",
                    ErrorContext::new("update_order_status")
                        .with_entity("order")
                        .with_entity_id(id),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn order_item_product_names(
        &self,
        id: OrderId,
    ) -> RepositoryResult<Vec<(ProductId, String)>> {
        self.with_conn(move |conn| {
            let rows: Vec<(i64, String)> = order_items::table
                .inner_join(products::table)
                .filter(order_items::order_id.eq(id.value()))
                .select((order_items::product_id, products::name))
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .map(|(product_id, name)| (ProductId::new(product_id), name))
                .collect())
        })
        .await
    }

    async fn dashboard_stats(&self) -> RepositoryResult<DashboardStats> {
        self.with_conn(|conn| {
            let total_products: i64 = products::table
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            let total_orders: i64 = orders::table
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            let total_customers: i64 = users::table
                .filter(users::role.eq("user"))
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            let total_revenue: Option<f64> = orders::table
                .filter(orders::status.eq(OrderStatus::Completed.as_str()))
                .select(sum(orders::total_amount))
                .first(conn)
                .map_err(map_diesel_error)?;

            Ok(DashboardStats {
                total_products,
                total_orders,
                total_customers,
                total_revenue: round_currency(total_revenue.unwrap_or(0.0)),
            })
        })
        .await
    }
}

#[async_trait]
impl AccountRepository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<UserRecord>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            let row: Option<UserRow> = users::table
                .filter(users::email.eq(&email))
                .select(UserRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?;
            Ok(row.map(UserRecord::from))
        })
        .await
    }

    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let row = NewUserRow {
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            role: "user".to_string(),
            is_active: true,
        };
        self.with_conn(move |conn| {
            // Unique violations on the email column surface as validation
            // errors via the diesel error mapping.
            let inserted: UserRow = diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(inserted.into())
        })
        .await
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> RepositoryResult<()> {
        let email = email.to_string();
        let password_hash = password_hash.to_string();
        self.with_conn(move |conn| {
            let affected = diesel::update(users::table.filter(users::email.eq(&email)))
                .set(users::password_hash.eq(&password_hash))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if affected == 0 {
                return Err(RepositoryError::not_found_with_context(
                    "User not found",
                    ErrorContext::new("update_password").with_entity("user"),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn update_profile(
        &self,
        id: UserId,
        full_name: &str,
        phone: &str,
    ) -> RepositoryResult<User> {
        let full_name = full_name.to_string();
        let phone = phone.to_string();
        self.with_conn(move |conn| {
            let updated: Option<UserRow> =
                diesel::update(users::table.filter(users::id.eq(id.value())))
                    .set((users::full_name.eq(&full_name), users::phone.eq(&phone)))
                    .returning(UserRow::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(map_diesel_error)?;
            updated.map(User::from).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "User not found",
                    ErrorContext::new("update_profile")
                        .with_entity("user")
                        .with_entity_id(id),
                )
            })
        })
        .await
    }

    async fn list_addresses(&self, user_id: UserId) -> RepositoryResult<Vec<Address>> {
        self.with_conn(move |conn| {
            let rows: Vec<AddressRow> = addresses::table
                .filter(addresses::user_id.eq(user_id.value()))
                .order((addresses::is_default.desc(), addresses::created_at.desc()))
                .select(AddressRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Address::from).collect())
        })
        .await
    }

    async fn create_address(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> RepositoryResult<Address> {
        let row = NewAddressRow {
            user_id: user_id.value(),
            label: address.label.clone(),
            recipient_name: address.recipient_name.clone(),
            phone: address.phone.clone(),
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            is_default: address.is_default,
        };
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                if row.is_default {
                    diesel::update(
                        addresses::table.filter(addresses::user_id.eq(row.user_id)),
                    )
                    .set(addresses::is_default.eq(false))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                }

                let inserted: AddressRow = diesel::insert_into(addresses::table)
                    .values(&row)
                    .returning(AddressRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                Ok(inserted.into())
            })
        })
        .await
    }

    async fn list_notifications(&self, user_id: UserId) -> RepositoryResult<Vec<Notification>> {
        self.with_conn(move |conn| {
            let rows: Vec<NotificationRow> = notifications::table
                .filter(notifications::user_id.eq(user_id.value()))
                .order(notifications::created_at.desc())
                .select(NotificationRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Notification::from).collect())
        })
        .await
    }

    async fn mark_notification_read(
        &self,
        user_id: UserId,
        notification_id: NotificationId,
    ) -> RepositoryResult<Notification> {
        self.with_conn(move |conn| {
            let updated: Option<NotificationRow> = diesel::update(
                notifications::table
                    .filter(notifications::id.eq(notification_id.value()))
                    .filter(notifications::user_id.eq(user_id.value())),
            )
            .set(notifications::is_read.eq(true))
            .returning(NotificationRow::as_returning())
            .get_result(conn)
            .optional()
            .map_err(map_diesel_error)?;
            updated.map(Notification::from).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "Notification not found",
                    ErrorContext::new("mark_notification_read")
                        .with_entity("notification")
                        .with_entity_id(notification_id),
                )
            })
        })
        .await
    }
}
