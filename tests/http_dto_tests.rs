//! Tests for the HTTP DTOs: envelope shape, request conversions, and the
//! serde field naming the frontend depends on.

#![cfg(feature = "http-server")]

use chrono::Utc;
use guaagsay_rust::api::{
    Notification, NotificationId, Order, OrderId, OrderItem, OrderStatus, ProductId, UserId,
};
use guaagsay_rust::http::dto::{
    AdminOrderDto, CreateOrderRequest, Envelope, OrderItemRequest, ProductQuery,
};

#[test]
fn test_envelope_success_shape() {
    let envelope = Envelope::data(vec![1, 2, 3]);
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    assert!(json.get("message").is_none());
    assert!(json.get("error").is_none());
}

#[test]
fn test_envelope_message_only() {
    let envelope = Envelope::message("Order status updated");
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Order status updated");
    assert!(json.get("data").is_none());
}

#[test]
fn test_envelope_error_shape() {
    let envelope = Envelope::error("Admin access required");
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Admin access required");
}

#[test]
fn test_create_order_request_conversion() {
    let request = CreateOrderRequest {
        user_id: Some(7),
        customer_name: "Maria".to_string(),
        customer_email: "maria@example.com".to_string(),
        customer_phone: String::new(),
        items: vec![OrderItemRequest {
            product_id: 3,
            quantity: 2,
        }],
    };

    let order: guaagsay_rust::api::NewOrder = request.into();
    assert_eq!(order.user_id, Some(UserId::new(7)));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_id, ProductId::new(3));
    assert_eq!(order.items[0].quantity, 2);
}

#[test]
fn test_create_order_request_minimal_json() {
    // user_id and customer_phone are optional in the request body.
    let request: CreateOrderRequest = serde_json::from_str(
        r#"{
            "customer_name": "Maria",
            "customer_email": "maria@example.com",
            "items": [{"product_id": 1, "quantity": 1}]
        }"#,
    )
    .unwrap();
    assert!(request.user_id.is_none());
    assert!(request.customer_phone.is_empty());
}

#[test]
fn test_product_query_blank_search_is_dropped() {
    let query = ProductQuery {
        search: Some("   ".to_string()),
        min_price: None,
        max_price: None,
    };
    let filter: guaagsay_rust::api::ProductFilter = query.into();
    assert!(filter.search.is_none());
}

#[test]
fn test_order_listing_omits_empty_items_and_user() {
    let order = Order {
        id: OrderId::new(1),
        user_id: None,
        customer_name: "Maria".to_string(),
        customer_email: "maria@example.com".to_string(),
        customer_phone: String::new(),
        total_amount: 21.0,
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        items: Vec::new(),
    };
    let json = serde_json::to_value(&order).unwrap();
    assert!(json.get("items").is_none());
    assert!(json.get("user_id").is_none());
    assert_eq!(json["status"], "pending");
}

#[test]
fn test_notification_kind_serializes_as_type() {
    let notification = Notification {
        id: NotificationId::new(1),
        user_id: UserId::new(2),
        title: "Order shipped".to_string(),
        body: String::new(),
        kind: "order".to_string(),
        is_read: false,
        created_at: Utc::now(),
    };
    let json = serde_json::to_value(&notification).unwrap();
    assert_eq!(json["type"], "order");
    assert!(json.get("kind").is_none());
}

#[test]
fn test_admin_order_dto_resolves_product_names() {
    let order = Order {
        id: OrderId::new(1),
        user_id: Some(UserId::new(2)),
        customer_name: "Maria".to_string(),
        customer_email: "maria@example.com".to_string(),
        customer_phone: String::new(),
        total_amount: 9.0,
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        items: vec![
            OrderItem {
                id: 10,
                order_id: OrderId::new(1),
                product_id: ProductId::new(3),
                quantity: 2,
                price: 4.5,
            },
            OrderItem {
                id: 11,
                order_id: OrderId::new(1),
                product_id: ProductId::new(4),
                quantity: 1,
                price: 0.0,
            },
        ],
    };
    let names = vec![(ProductId::new(3), "Green Tea".to_string())];

    let dto = AdminOrderDto::from_parts(order, names);
    assert_eq!(dto.items.len(), 2);
    assert_eq!(dto.items[0].product_name, "Green Tea");
    // A deleted product leaves the name blank rather than failing the view.
    assert_eq!(dto.items[1].product_name, "");
}
