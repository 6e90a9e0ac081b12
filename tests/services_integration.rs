//! End-to-end flow through the service layer against the local repository:
//! a customer registers, browses the catalog, places an order, and an admin
//! fulfils it.

use guaagsay_rust::api::{
    NewAddress, NewOrder, NewOrderItem, NewProduct, NewUser, OrderStatus, ProductFilter,
    StockPolicy,
};
use guaagsay_rust::db::repositories::LocalRepository;
use guaagsay_rust::db::services;

#[tokio::test]
async fn test_store_flow_from_registration_to_fulfilment() {
    let repo = LocalRepository::new();

    // Admin seeds the catalog.
    let category = repo.seed_category("Beverages", "Hot and cold drinks");
    let tea = services::create_product(
        &repo,
        &NewProduct {
            category_id: category.id,
            name: "Green Tea".to_string(),
            description: "Loose leaf".to_string(),
            price: 4.5,
            stock: 20,
            image_url: String::new(),
        },
    )
    .await
    .unwrap();
    let coffee = services::create_product(
        &repo,
        &NewProduct {
            category_id: category.id,
            name: "Coffee Beans".to_string(),
            description: "Arabica".to_string(),
            price: 12.0,
            stock: 8,
            image_url: String::new(),
        },
    )
    .await
    .unwrap();

    // A customer signs up and saves a delivery address.
    let customer = services::register_user(
        &repo,
        &NewUser {
            email: "maria@example.com".to_string(),
            password_hash: "$2b$04$placeholderhash".to_string(),
            full_name: "Maria Santos".to_string(),
            phone: "0917".to_string(),
        },
    )
    .await
    .unwrap();

    services::create_address(
        &repo,
        customer.id,
        &NewAddress {
            label: "Home".to_string(),
            recipient_name: "Maria Santos".to_string(),
            phone: "0917".to_string(),
            street: "Main St 1".to_string(),
            city: "Zamboanga".to_string(),
            state: String::new(),
            postal_code: "7000".to_string(),
            is_default: true,
        },
    )
    .await
    .unwrap();

    // Browse the catalog.
    let found = services::list_products(
        &repo,
        &ProductFilter {
            search: Some("tea".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, tea.id);

    let in_category = services::list_products_by_category(&repo, category.id)
        .await
        .unwrap();
    assert_eq!(in_category.len(), 2);

    // Place an order; the total comes from catalog prices.
    let order = services::place_order(
        &repo,
        &NewOrder {
            user_id: Some(customer.id),
            customer_name: customer.full_name.clone(),
            customer_email: customer.email.clone(),
            customer_phone: "0917".to_string(),
            items: vec![
                NewOrderItem {
                    product_id: tea.id,
                    quantity: 2,
                },
                NewOrderItem {
                    product_id: coffee.id,
                    quantity: 1,
                },
            ],
        },
        StockPolicy::Reject,
    )
    .await
    .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, 21.0); // 2*4.5 + 1*12.0
    assert_eq!(order.user_id, Some(customer.id));

    // Stock was decremented.
    assert_eq!(services::get_product(&repo, tea.id).await.unwrap().stock, 18);
    assert_eq!(
        services::get_product(&repo, coffee.id).await.unwrap().stock,
        7
    );

    // Admin reviews and fulfils the order.
    let (details, names) = services::order_details(&repo, order.id).await.unwrap();
    assert_eq!(details.items.len(), 2);
    assert!(names.iter().any(|(_, name)| name == "Green Tea"));

    services::update_order_status(&repo, order.id, OrderStatus::Processing)
        .await
        .unwrap();
    services::update_order_status(&repo, order.id, OrderStatus::Completed)
        .await
        .unwrap();

    let stats = services::dashboard_stats(&repo).await.unwrap();
    assert_eq!(stats.total_products, 2);
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.total_customers, 1);
    assert_eq!(stats.total_revenue, 21.0);
}

#[tokio::test]
async fn test_rejected_order_leaves_no_trace() {
    let repo = LocalRepository::new();
    let category = repo.seed_category("Beverages", "");
    let tea = services::create_product(
        &repo,
        &NewProduct {
            category_id: category.id,
            name: "Green Tea".to_string(),
            description: String::new(),
            price: 4.5,
            stock: 1,
            image_url: String::new(),
        },
    )
    .await
    .unwrap();

    let result = services::place_order(
        &repo,
        &NewOrder {
            user_id: None,
            customer_name: "Maria".to_string(),
            customer_email: "maria@example.com".to_string(),
            customer_phone: String::new(),
            items: vec![NewOrderItem {
                product_id: tea.id,
                quantity: 5,
            }],
        },
        StockPolicy::Reject,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(services::get_product(&repo, tea.id).await.unwrap().stock, 1);
    assert!(services::list_orders(&repo, None).await.unwrap().is_empty());

    let stats = services::dashboard_stats(&repo).await.unwrap();
    assert_eq!(stats.total_orders, 0);
    assert_eq!(stats.total_revenue, 0.0);
}
