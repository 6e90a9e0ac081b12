#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::api::{round_currency, OrderId, OrderStatus, ProductId, StockPolicy, UserId};

    #[test]
    fn test_product_id_new() {
        let id = ProductId::new(42);
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn test_order_id_equality() {
        let id1 = OrderId::new(100);
        let id2 = OrderId::new(100);
        let id3 = OrderId::new(101);

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId::new(7).to_string(), "7");
    }

    #[test]
    fn test_ids_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(ProductId::new(1));
        set.insert(ProductId::new(2));
        set.insert(ProductId::new(1)); // Duplicate

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_order_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn test_order_status_rejects_unknown() {
        assert!(OrderStatus::from_str("shipped").is_err());
        assert!(OrderStatus::from_str("PENDING").is_err());
        assert!(OrderStatus::from_str("").is_err());
    }

    #[test]
    fn test_order_status_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");

        let status: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_stock_policy_default_rejects() {
        assert_eq!(StockPolicy::default(), StockPolicy::Reject);
    }

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(19.999), 20.0);
        assert_eq!(round_currency(0.1 + 0.2), 0.3);
        assert_eq!(round_currency(12.345), 12.35);
    }
}
