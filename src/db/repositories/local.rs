//! In-memory repository implementation.
//!
//! `LocalRepository` keeps every table in a `parking_lot::RwLock`-protected
//! map. It is used for unit testing and local development; the Postgres
//! implementation is the production backend.
//!
//! Order placement mirrors the transactional semantics of the SQL backend:
//! all lines are applied to a scratch copy of the product table first, so a
//! failure partway through leaves no partial state behind.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::api::{
    Address, AddressId, Category, CategoryId, DashboardStats, NewAddress, NewOrder, NewProduct,
    NewUser, Notification, NotificationId, Order, OrderId, OrderItem, OrderStatus, Product,
    ProductFilter, ProductId, StockPolicy, User, UserId, UserRecord, round_currency,
};
use crate::db::repository::{
    AccountRepository, CatalogRepository, ErrorContext, OrderRepository, RepositoryError,
    RepositoryResult,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, Product>,
    orders: BTreeMap<i64, Order>,
    order_items: Vec<OrderItem>,
    addresses: BTreeMap<i64, Address>,
    notifications: BTreeMap<i64, Notification>,
    next_id: i64,
}

impl Tables {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory repository for unit testing and local development.
#[derive(Default)]
pub struct LocalRepository {
    tables: RwLock<Tables>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category directly. Test/dev seeding helper; there is no
    /// public endpoint for category creation.
    pub fn seed_category(&self, name: &str, description: &str) -> Category {
        let mut tables = self.tables.write();
        let id = tables.alloc_id();
        let category = Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: description.to_string(),
            image_url: String::new(),
            created_at: Utc::now(),
        };
        tables.categories.insert(id, category.clone());
        category
    }

    /// Insert a notification directly. Test/dev seeding helper; the backend
    /// only reads and marks notifications, it never creates them.
    pub fn seed_notification(&self, user_id: UserId, title: &str, body: &str) -> Notification {
        let mut tables = self.tables.write();
        let id = tables.alloc_id();
        let notification = Notification {
            id: NotificationId::new(id),
            user_id,
            title: title.to_string(),
            body: body.to_string(),
            kind: "info".to_string(),
            is_read: false,
            created_at: Utc::now(),
        };
        tables.notifications.insert(id, notification.clone());
        notification
    }

    /// Flip a user's is_active flag. Test/dev seeding helper.
    pub fn set_user_active(&self, id: UserId, is_active: bool) {
        let mut tables = self.tables.write();
        if let Some(user) = tables.users.get_mut(&id.value()) {
            user.is_active = is_active;
        }
    }
}

fn product_matches(product: &Product, filter: &ProductFilter) -> bool {
    if let Some(ref search) = filter.search {
        let needle = search.to_lowercase();
        if !product.name.to_lowercase().contains(&needle)
            && !product.description.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    if let Some(min) = filter.min_price {
        if product.price < min {
            return false;
        }
    }
    if let Some(max) = filter.max_price {
        if product.price > max {
            return false;
        }
    }
    true
}

fn sort_by_name(mut products: Vec<Product>) -> Vec<Product> {
    products.sort_by(|a, b| a.name.cmp(&b.name));
    products
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn list_products(&self, filter: &ProductFilter) -> RepositoryResult<Vec<Product>> {
        let tables = self.tables.read();
        let products = tables
            .products
            .values()
            .filter(|p| product_matches(p, filter))
            .cloned()
            .collect();
        Ok(sort_by_name(products))
    }

    async fn get_product(&self, id: ProductId) -> RepositoryResult<Product> {
        let tables = self.tables.read();
        tables.products.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Product not found",
                ErrorContext::new("get_product")
                    .with_entity("product")
                    .with_entity_id(id),
            )
        })
    }

    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> RepositoryResult<Vec<Product>> {
        let tables = self.tables.read();
        let products = tables
            .products
            .values()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect();
        Ok(sort_by_name(products))
    }

    async fn list_products_with_categories(
        &self,
    ) -> RepositoryResult<Vec<(Product, Option<Category>)>> {
        let tables = self.tables.read();
        let mut rows: Vec<(Product, Option<Category>)> = tables
            .products
            .values()
            .map(|p| {
                let category = tables.categories.get(&p.category_id.value()).cloned();
                (p.clone(), category)
            })
            .collect();
        rows.sort_by(|(a, _), (b, _)| {
            b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    async fn create_product(&self, product: &NewProduct) -> RepositoryResult<Product> {
        let mut tables = self.tables.write();
        let id = tables.alloc_id();
        let row = Product {
            id: ProductId::new(id),
            category_id: product.category_id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            image_url: product.image_url.clone(),
            created_at: Utc::now(),
        };
        tables.products.insert(id, row.clone());
        Ok(row)
    }

    async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> RepositoryResult<Product> {
        let mut tables = self.tables.write();
        let row = tables.products.get_mut(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Product not found",
                ErrorContext::new("update_product")
                    .with_entity("product")
                    .with_entity_id(id),
            )
        })?;
        row.category_id = product.category_id;
        row.name = product.name.clone();
        row.description = product.description.clone();
        row.price = product.price;
        row.stock = product.stock;
        row.image_url = product.image_url.clone();
        Ok(row.clone())
    }

    async fn delete_product(&self, id: ProductId) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        tables.products.remove(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Product not found",
                ErrorContext::new("delete_product")
                    .with_entity("product")
                    .with_entity_id(id),
            )
        })?;
        Ok(())
    }

    async fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        let tables = self.tables.read();
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Category> {
        let tables = self.tables.read();
        tables.categories.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Category not found",
                ErrorContext::new("get_category")
                    .with_entity("category")
                    .with_entity_id(id),
            )
        })
    }
}

#[async_trait]
impl OrderRepository for LocalRepository {
    async fn place_order(
        &self,
        order: &NewOrder,
        policy: StockPolicy,
    ) -> RepositoryResult<Order> {
        let mut tables = self.tables.write();

        // Apply every line to a scratch copy of the stock column first so a
        // mid-order failure persists nothing.
        let mut new_stock: BTreeMap<i64, i32> = BTreeMap::new();
        let mut priced_items: Vec<(ProductId, i32, f64)> = Vec::with_capacity(order.items.len());

        for item in &order.items {
            let product = tables.products.get(&item.product_id.value()).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "Invalid product ID",
                    ErrorContext::new("place_order")
                        .with_entity("product")
                        .with_entity_id(item.product_id),
                )
            })?;

            let stock = new_stock
                .entry(product.id.value())
                .or_insert(product.stock);
            if policy == StockPolicy::Reject && *stock < item.quantity {
                return Err(RepositoryError::validation_with_context(
                    format!("Insufficient stock for product {}", product.id),
                    ErrorContext::new("place_order")
                        .with_entity("product")
                        .with_entity_id(product.id)
                        .with_details(format!("stock={}, requested={}", stock, item.quantity)),
                ));
            }
            *stock -= item.quantity;
            priced_items.push((product.id, item.quantity, product.price));
        }

        let total_amount = round_currency(
            priced_items
                .iter()
                .map(|(_, quantity, price)| price * f64::from(*quantity))
                .sum(),
        );

        let order_id = tables.alloc_id();
        let mut items = Vec::with_capacity(priced_items.len());
        for (product_id, quantity, price) in priced_items {
            let item_id = tables.alloc_id();
            items.push(OrderItem {
                id: item_id,
                order_id: OrderId::new(order_id),
                product_id,
                quantity,
                price,
            });
        }

        for (product_id, stock) in new_stock {
            if let Some(product) = tables.products.get_mut(&product_id) {
                product.stock = stock;
            }
        }

        let row = Order {
            id: OrderId::new(order_id),
            user_id: order.user_id,
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            customer_phone: order.customer_phone.clone(),
            total_amount,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            items: items.clone(),
        };
        tables.order_items.extend(items);
        tables.orders.insert(order_id, row.clone());
        Ok(row)
    }

    async fn get_order(&self, id: OrderId) -> RepositoryResult<Order> {
        let tables = self.tables.read();
        let mut order = tables.orders.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Order not found",
                ErrorContext::new("get_order")
                    .with_entity("order")
                    .with_entity_id(id),
            )
        })?;
        order.items = tables
            .order_items
            .iter()
            .filter(|item| item.order_id == id)
            .cloned()
            .collect();
        Ok(order)
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> RepositoryResult<Vec<Order>> {
        let tables = self.tables.read();
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| status.is_none_or(|s| o.status == s))
            .map(|o| Order {
                items: Vec::new(),
                ..o.clone()
            })
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        let order = tables.orders.get_mut(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Order not found",
                ErrorContext::new("update_order_status")
                    .with_entity("order")
                    .with_entity_id(id),
            )
        })?;
        order.status = status;
        Ok(())
    }

    async fn order_item_product_names(
        &self,
        id: OrderId,
    ) -> RepositoryResult<Vec<(ProductId, String)>> {
        let tables = self.tables.read();
        Ok(tables
            .order_items
            .iter()
            .filter(|item| item.order_id == id)
            .map(|item| {
                let name = tables
                    .products
                    .get(&item.product_id.value())
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                (item.product_id, name)
            })
            .collect())
    }

    async fn dashboard_stats(&self) -> RepositoryResult<DashboardStats> {
        let tables = self.tables.read();
        let total_revenue = tables
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::Completed)
            .map(|o| o.total_amount)
            .sum();
        Ok(DashboardStats {
            total_products: tables.products.len() as i64,
            total_orders: tables.orders.len() as i64,
            total_customers: tables.users.values().filter(|u| u.role == "user").count() as i64,
            total_revenue: round_currency(total_revenue),
        })
    }
}

#[async_trait]
impl AccountRepository for LocalRepository {
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<UserRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::validation_with_context(
                "Email already registered",
                ErrorContext::new("create_user").with_entity("user"),
            ));
        }
        let id = tables.alloc_id();
        let record = UserRecord {
            id: UserId::new(id),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            role: "user".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        let profile = record.profile();
        tables.users.insert(id, record);
        Ok(profile)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> RepositoryResult<()> {
        let mut tables = self.tables.write();
        let user = tables
            .users
            .values_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "User not found",
                    ErrorContext::new("update_password").with_entity("user"),
                )
            })?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn update_profile(
        &self,
        id: UserId,
        full_name: &str,
        phone: &str,
    ) -> RepositoryResult<User> {
        let mut tables = self.tables.write();
        let user = tables.users.get_mut(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "User not found",
                ErrorContext::new("update_profile")
                    .with_entity("user")
                    .with_entity_id(id),
            )
        })?;
        user.full_name = full_name.to_string();
        user.phone = phone.to_string();
        Ok(user.profile())
    }

    async fn list_addresses(&self, user_id: UserId) -> RepositoryResult<Vec<Address>> {
        let tables = self.tables.read();
        let mut addresses: Vec<Address> = tables
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        addresses.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(addresses)
    }

    async fn create_address(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> RepositoryResult<Address> {
        let mut tables = self.tables.write();
        if address.is_default {
            for existing in tables.addresses.values_mut() {
                if existing.user_id == user_id {
                    existing.is_default = false;
                }
            }
        }
        let id = tables.alloc_id();
        let row = Address {
            id: AddressId::new(id),
            user_id,
            label: address.label.clone(),
            recipient_name: address.recipient_name.clone(),
            phone: address.phone.clone(),
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            is_default: address.is_default,
            created_at: Utc::now(),
        };
        tables.addresses.insert(id, row.clone());
        Ok(row)
    }

    async fn list_notifications(&self, user_id: UserId) -> RepositoryResult<Vec<Notification>> {
        let tables = self.tables.read();
        let mut notifications: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        user_id: UserId,
        notification_id: NotificationId,
    ) -> RepositoryResult<Notification> {
        let mut tables = self.tables.write();
        let notification = tables
            .notifications
            .get_mut(&notification_id.value())
            .filter(|n| n.user_id == user_id)
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "Notification not found",
                    ErrorContext::new("mark_notification_read")
                        .with_entity("notification")
                        .with_entity_id(notification_id),
                )
            })?;
        notification.is_read = true;
        Ok(notification.clone())
    }
}
