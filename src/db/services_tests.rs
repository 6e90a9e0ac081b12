//! Unit tests for the service layer, run against the in-memory repository.

use crate::api::{
    NewAddress, NewOrder, NewOrderItem, NewProduct, NewUser, OrderStatus, ProductFilter,
    ProductId, StockPolicy,
};
use crate::db::repositories::LocalRepository;
use crate::db::repository::RepositoryError;
use crate::db::services;

fn new_product(category_id: crate::api::CategoryId, name: &str, price: f64, stock: i32) -> NewProduct {
    NewProduct {
        category_id,
        name: name.to_string(),
        description: String::new(),
        price,
        stock,
        image_url: String::new(),
    }
}

fn new_order(items: Vec<NewOrderItem>) -> NewOrder {
    NewOrder {
        user_id: None,
        customer_name: "Alice".to_string(),
        customer_email: "alice@example.com".to_string(),
        customer_phone: String::new(),
        items,
    }
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "hash".to_string(),
        full_name: "Alice".to_string(),
        phone: String::new(),
    }
}

#[tokio::test]
async fn test_create_product_requires_name_and_price() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("Drinks", "");

    let err = services::create_product(&repo, &new_product(category.id, "  ", 1.0, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let err = services::create_product(&repo, &new_product(category.id, "Tea", 0.0, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
}

#[tokio::test]
async fn test_create_product_rejects_unknown_category() {
    let repo = LocalRepository::new();
    let err = services::create_product(
        &repo,
        &new_product(crate::api::CategoryId::new(999), "Tea", 1.0, 5),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
}

#[tokio::test]
async fn test_create_and_list_products() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("Drinks", "");

    services::create_product(&repo, &new_product(category.id, "Tea", 2.5, 10))
        .await
        .unwrap();
    services::create_product(&repo, &new_product(category.id, "Coffee", 3.0, 10))
        .await
        .unwrap();

    let products = services::list_products(&repo, &ProductFilter::default())
        .await
        .unwrap();
    assert_eq!(products.len(), 2);
    // Ordered by name.
    assert_eq!(products[0].name, "Coffee");
    assert_eq!(products[1].name, "Tea");
}

#[tokio::test]
async fn test_place_order_computes_total_and_decrements_stock() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("Drinks", "");
    let tea = services::create_product(&repo, &new_product(category.id, "Tea", 2.5, 10))
        .await
        .unwrap();
    let coffee = services::create_product(&repo, &new_product(category.id, "Coffee", 3.0, 4))
        .await
        .unwrap();

    let order = services::place_order(
        &repo,
        &new_order(vec![
            NewOrderItem {
                product_id: tea.id,
                quantity: 2,
            },
            NewOrderItem {
                product_id: coffee.id,
                quantity: 3,
            },
        ]),
        StockPolicy::Reject,
    )
    .await
    .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, 14.0); // 2*2.5 + 3*3.0
    assert_eq!(order.items.len(), 2);

    let tea = services::get_product(&repo, tea.id).await.unwrap();
    let coffee = services::get_product(&repo, coffee.id).await.unwrap();
    assert_eq!(tea.stock, 8);
    assert_eq!(coffee.stock, 1);
}

#[tokio::test]
async fn test_place_order_validates_input() {
    let repo = LocalRepository::new();

    let err = services::place_order(&repo, &new_order(vec![]), StockPolicy::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let mut order = new_order(vec![NewOrderItem {
        product_id: ProductId::new(1),
        quantity: 0,
    }]);
    let err = services::place_order(&repo, &order, StockPolicy::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    order.customer_name = String::new();
    order.items[0].quantity = 1;
    let err = services::place_order(&repo, &order, StockPolicy::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
}

#[tokio::test]
async fn test_place_order_rejects_insufficient_stock() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("Drinks", "");
    let tea = services::create_product(&repo, &new_product(category.id, "Tea", 2.5, 1))
        .await
        .unwrap();

    let err = services::place_order(
        &repo,
        &new_order(vec![NewOrderItem {
            product_id: tea.id,
            quantity: 2,
        }]),
        StockPolicy::Reject,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    // Nothing was persisted.
    let tea = services::get_product(&repo, tea.id).await.unwrap();
    assert_eq!(tea.stock, 1);
    assert!(services::list_orders(&repo, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_place_order_allow_negative_stock() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("Drinks", "");
    let tea = services::create_product(&repo, &new_product(category.id, "Tea", 2.5, 1))
        .await
        .unwrap();

    services::place_order(
        &repo,
        &new_order(vec![NewOrderItem {
            product_id: tea.id,
            quantity: 2,
        }]),
        StockPolicy::AllowNegative,
    )
    .await
    .unwrap();

    let tea = services::get_product(&repo, tea.id).await.unwrap();
    assert_eq!(tea.stock, -1);
}

#[tokio::test]
async fn test_place_order_is_atomic_on_missing_product() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("Drinks", "");
    let tea = services::create_product(&repo, &new_product(category.id, "Tea", 2.5, 10))
        .await
        .unwrap();

    let err = services::place_order(
        &repo,
        &new_order(vec![
            NewOrderItem {
                product_id: tea.id,
                quantity: 2,
            },
            NewOrderItem {
                product_id: ProductId::new(999),
                quantity: 1,
            },
        ]),
        StockPolicy::Reject,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    // The first line's decrement was rolled back with the rest.
    let tea = services::get_product(&repo, tea.id).await.unwrap();
    assert_eq!(tea.stock, 10);
    assert!(services::list_orders(&repo, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_order_status() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("Drinks", "");
    let tea = services::create_product(&repo, &new_product(category.id, "Tea", 2.5, 10))
        .await
        .unwrap();
    let order = services::place_order(
        &repo,
        &new_order(vec![NewOrderItem {
            product_id: tea.id,
            quantity: 1,
        }]),
        StockPolicy::Reject,
    )
    .await
    .unwrap();

    services::update_order_status(&repo, order.id, OrderStatus::Completed)
        .await
        .unwrap();
    let fetched = services::get_order(&repo, order.id).await.unwrap();
    assert_eq!(fetched.status, OrderStatus::Completed);

    let err = services::update_order_status(
        &repo,
        crate::api::OrderId::new(999),
        OrderStatus::Completed,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_order_details_includes_product_names() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("Drinks", "");
    let tea = services::create_product(&repo, &new_product(category.id, "Tea", 2.5, 10))
        .await
        .unwrap();
    let order = services::place_order(
        &repo,
        &new_order(vec![NewOrderItem {
            product_id: tea.id,
            quantity: 1,
        }]),
        StockPolicy::Reject,
    )
    .await
    .unwrap();

    let (fetched, names) = services::order_details(&repo, order.id).await.unwrap();
    assert_eq!(fetched.id, order.id);
    assert_eq!(names, vec![(tea.id, "Tea".to_string())]);
}

#[tokio::test]
async fn test_dashboard_stats_counts_completed_revenue() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("Drinks", "");
    let tea = services::create_product(&repo, &new_product(category.id, "Tea", 2.5, 10))
        .await
        .unwrap();

    let first = services::place_order(
        &repo,
        &new_order(vec![NewOrderItem {
            product_id: tea.id,
            quantity: 2,
        }]),
        StockPolicy::Reject,
    )
    .await
    .unwrap();
    services::place_order(
        &repo,
        &new_order(vec![NewOrderItem {
            product_id: tea.id,
            quantity: 1,
        }]),
        StockPolicy::Reject,
    )
    .await
    .unwrap();
    services::update_order_status(&repo, first.id, OrderStatus::Completed)
        .await
        .unwrap();

    let stats = services::dashboard_stats(&repo).await.unwrap();
    assert_eq!(stats.total_products, 1);
    assert_eq!(stats.total_orders, 2);
    // Only the completed order counts toward revenue.
    assert_eq!(stats.total_revenue, 5.0);
}

#[tokio::test]
async fn test_register_user_validates_and_rejects_duplicates() {
    let repo = LocalRepository::new();

    let err = services::register_user(&repo, &new_user("not-an-email"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let user = services::register_user(&repo, &new_user("alice@example.com"))
        .await
        .unwrap();
    assert_eq!(user.role, "user");

    let err = services::register_user(&repo, &new_user("alice@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
}

#[tokio::test]
async fn test_reset_password_overwrites_hash() {
    let repo = LocalRepository::new();
    services::register_user(&repo, &new_user("alice@example.com"))
        .await
        .unwrap();

    services::reset_password(&repo, "alice@example.com", "newhash")
        .await
        .unwrap();
    let record = services::find_user_by_email(&repo, "alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.password_hash, "newhash");

    let err = services::reset_password(&repo, "bob@example.com", "newhash")
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_update_profile_requires_name() {
    let repo = LocalRepository::new();
    let user = services::register_user(&repo, &new_user("alice@example.com"))
        .await
        .unwrap();

    let err = services::update_profile(&repo, user.id, "", "123")
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    let updated = services::update_profile(&repo, user.id, "Alice B", "123")
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Alice B");
}

#[tokio::test]
async fn test_create_address_requires_street_and_city() {
    let repo = LocalRepository::new();
    let user = services::register_user(&repo, &new_user("alice@example.com"))
        .await
        .unwrap();

    let mut address = NewAddress {
        label: "Home".to_string(),
        recipient_name: "Alice".to_string(),
        phone: String::new(),
        street: String::new(),
        city: "Zamboanga".to_string(),
        state: String::new(),
        postal_code: String::new(),
        is_default: true,
    };
    let err = services::create_address(&repo, user.id, &address)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    address.street = "Main St 1".to_string();
    let created = services::create_address(&repo, user.id, &address)
        .await
        .unwrap();
    assert!(created.is_default);
}

#[tokio::test]
async fn test_default_address_is_exclusive() {
    let repo = LocalRepository::new();
    let user = services::register_user(&repo, &new_user("alice@example.com"))
        .await
        .unwrap();

    let address = NewAddress {
        label: "Home".to_string(),
        recipient_name: "Alice".to_string(),
        phone: String::new(),
        street: "Main St 1".to_string(),
        city: "Zamboanga".to_string(),
        state: String::new(),
        postal_code: String::new(),
        is_default: true,
    };
    let first = services::create_address(&repo, user.id, &address).await.unwrap();
    let second = services::create_address(&repo, user.id, &address).await.unwrap();

    let addresses = services::list_addresses(&repo, user.id).await.unwrap();
    assert_eq!(addresses.len(), 2);
    assert_eq!(addresses[0].id, second.id);
    assert!(addresses[0].is_default);
    assert!(!addresses.iter().any(|a| a.id == first.id && a.is_default));
}

#[tokio::test]
async fn test_mark_notification_read_is_idempotent_and_scoped() {
    let repo = LocalRepository::new();
    let alice = services::register_user(&repo, &new_user("alice@example.com"))
        .await
        .unwrap();
    let bob = services::register_user(&repo, &new_user("bob@example.com"))
        .await
        .unwrap();
    let notification = repo.seed_notification(alice.id, "Order shipped", "On its way");

    let read = services::mark_notification_read(&repo, alice.id, notification.id)
        .await
        .unwrap();
    assert!(read.is_read);
    // Second call succeeds and leaves state unchanged.
    let read = services::mark_notification_read(&repo, alice.id, notification.id)
        .await
        .unwrap();
    assert!(read.is_read);

    // Another user's notification is invisible.
    let err = services::mark_notification_read(&repo, bob.id, notification.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}
