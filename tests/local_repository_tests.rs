//! Tests for LocalRepository.
//!
//! These cover filtering, ordering guarantees, concurrent order placement,
//! and the account operations at the repository level. Business rule
//! validation is tested separately at the service layer.

use std::sync::Arc;

use guaagsay_rust::api::{
    NewAddress, NewOrder, NewOrderItem, NewProduct, NewUser, OrderStatus, ProductFilter,
    StockPolicy,
};
use guaagsay_rust::db::repositories::LocalRepository;
use guaagsay_rust::db::repository::{
    AccountRepository, CatalogRepository, OrderRepository, RepositoryError,
};

async fn seed_product(repo: &LocalRepository, name: &str, price: f64, stock: i32) -> guaagsay_rust::api::Product {
    let category = repo.seed_category("General", "");
    repo.create_product(&NewProduct {
        category_id: category.id,
        name: name.to_string(),
        description: format!("{} description", name),
        price,
        stock,
        image_url: String::new(),
    })
    .await
    .unwrap()
}

fn order_for(items: Vec<NewOrderItem>) -> NewOrder {
    NewOrder {
        user_id: None,
        customer_name: "Alice".to_string(),
        customer_email: "alice@example.com".to_string(),
        customer_phone: String::new(),
        items,
    }
}

#[tokio::test]
async fn test_health_check() {
    let repo = LocalRepository::new();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_product_search_is_case_insensitive() {
    let repo = LocalRepository::new();
    seed_product(&repo, "Green Tea", 2.0, 5).await;
    seed_product(&repo, "Coffee", 3.0, 5).await;

    let filter = ProductFilter {
        search: Some("green".to_string()),
        ..Default::default()
    };
    let products = repo.list_products(&filter).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Green Tea");
}

#[tokio::test]
async fn test_product_price_filter() {
    let repo = LocalRepository::new();
    seed_product(&repo, "Cheap", 1.0, 5).await;
    seed_product(&repo, "Mid", 5.0, 5).await;
    seed_product(&repo, "Expensive", 10.0, 5).await;

    let filter = ProductFilter {
        min_price: Some(2.0),
        max_price: Some(9.0),
        ..Default::default()
    };
    let products = repo.list_products(&filter).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Mid");
}

#[tokio::test]
async fn test_update_and_delete_unknown_product() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("General", "");

    let err = repo
        .update_product(
            guaagsay_rust::api::ProductId::new(999),
            &NewProduct {
                category_id: category.id,
                name: "Ghost".to_string(),
                description: String::new(),
                price: 1.0,
                stock: 0,
                image_url: String::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    let err = repo
        .delete_product(guaagsay_rust::api::ProductId::new(999))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_products_with_categories_newest_first() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("General", "");
    let first = repo
        .create_product(&NewProduct {
            category_id: category.id,
            name: "Older".to_string(),
            description: String::new(),
            price: 1.0,
            stock: 1,
            image_url: String::new(),
        })
        .await
        .unwrap();
    let second = repo
        .create_product(&NewProduct {
            category_id: category.id,
            name: "Newer".to_string(),
            description: String::new(),
            price: 2.0,
            stock: 1,
            image_url: String::new(),
        })
        .await
        .unwrap();

    let rows = repo.list_products_with_categories().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0.id, second.id);
    assert_eq!(rows[1].0.id, first.id);
    assert_eq!(rows[0].1.as_ref().unwrap().name, "General");
}

#[tokio::test]
async fn test_order_item_price_is_a_snapshot() {
    let repo = LocalRepository::new();
    let product = seed_product(&repo, "Tea", 2.0, 10).await;

    let order = repo
        .place_order(
            &order_for(vec![NewOrderItem {
                product_id: product.id,
                quantity: 1,
            }]),
            StockPolicy::Reject,
        )
        .await
        .unwrap();

    // Raise the catalog price after the order was placed.
    repo.update_product(
        product.id,
        &NewProduct {
            category_id: product.category_id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: 99.0,
            stock: product.stock,
            image_url: product.image_url.clone(),
        },
    )
    .await
    .unwrap();

    let fetched = repo.get_order(order.id).await.unwrap();
    assert_eq!(fetched.items[0].price, 2.0);
    assert_eq!(fetched.total_amount, 2.0);
}

#[tokio::test]
async fn test_concurrent_orders_never_oversell() {
    let repo = Arc::new(LocalRepository::new());
    let product = seed_product(&repo, "Limited", 1.0, 5).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let repo = Arc::clone(&repo);
        let product_id = product.id;
        handles.push(tokio::spawn(async move {
            repo.place_order(
                &NewOrder {
                    user_id: None,
                    customer_name: "Racer".to_string(),
                    customer_email: "racer@example.com".to_string(),
                    customer_phone: String::new(),
                    items: vec![NewOrderItem {
                        product_id,
                        quantity: 1,
                    }],
                },
                StockPolicy::Reject,
            )
            .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 5);
    let product = repo.get_product(product.id).await.unwrap();
    assert_eq!(product.stock, 0);
}

#[tokio::test]
async fn test_list_orders_newest_first_with_status_filter() {
    let repo = LocalRepository::new();
    let product = seed_product(&repo, "Tea", 2.0, 100).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let order = repo
            .place_order(
                &order_for(vec![NewOrderItem {
                    product_id: product.id,
                    quantity: 1,
                }]),
                StockPolicy::Reject,
            )
            .await
            .unwrap();
        ids.push(order.id);
    }
    repo.update_order_status(ids[1], OrderStatus::Completed)
        .await
        .unwrap();

    let all = repo.list_orders(None).await.unwrap();
    assert_eq!(all.len(), 3);
    // Newest first; listings omit items.
    assert_eq!(all[0].id, ids[2]);
    assert!(all[0].items.is_empty());

    let completed = repo.list_orders(Some(OrderStatus::Completed)).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, ids[1]);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let repo = LocalRepository::new();
    let user = NewUser {
        email: "alice@example.com".to_string(),
        password_hash: "hash".to_string(),
        full_name: "Alice".to_string(),
        phone: String::new(),
    };
    repo.create_user(&user).await.unwrap();
    let err = repo.create_user(&user).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
}

#[tokio::test]
async fn test_addresses_sorted_default_first() {
    let repo = LocalRepository::new();
    let user = repo
        .create_user(&NewUser {
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Alice".to_string(),
            phone: String::new(),
        })
        .await
        .unwrap();

    let make_address = |street: &str, is_default: bool| NewAddress {
        label: String::new(),
        recipient_name: "Alice".to_string(),
        phone: String::new(),
        street: street.to_string(),
        city: "Zamboanga".to_string(),
        state: String::new(),
        postal_code: String::new(),
        is_default,
    };

    repo.create_address(user.id, &make_address("First St", false))
        .await
        .unwrap();
    let default = repo
        .create_address(user.id, &make_address("Second St", true))
        .await
        .unwrap();
    repo.create_address(user.id, &make_address("Third St", false))
        .await
        .unwrap();

    let addresses = repo.list_addresses(user.id).await.unwrap();
    assert_eq!(addresses.len(), 3);
    assert_eq!(addresses[0].id, default.id);
    assert!(addresses[0].is_default);
}

#[tokio::test]
async fn test_notifications_newest_first() {
    let repo = LocalRepository::new();
    let user = repo
        .create_user(&NewUser {
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Alice".to_string(),
            phone: String::new(),
        })
        .await
        .unwrap();

    repo.seed_notification(user.id, "first", "");
    let second = repo.seed_notification(user.id, "second", "");

    let notifications = repo.list_notifications(user.id).await.unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].id, second.id);
}
