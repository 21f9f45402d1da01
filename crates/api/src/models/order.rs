//! Order types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use priceworth_core::{
    CustomerId, OrderId, OrderItemId, OrderStatus, PaymentStatus, Quantity, VariantId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// `None` for guest checkouts.
    pub customer_id: Option<CustomerId>,
    pub billing_address: String,
    pub shipping_method_id: i32,
    pub shipping_address: String,
    pub is_pickup: bool,
    pub pickup_address: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub order_items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_variant_id: VariantId,
    pub quantity: Quantity,
}

/// Request body for placing an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub billing_address: String,
    pub shipping_method_id: i32,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default, alias = "isPickUp")]
    pub is_pickup: bool,
    #[serde(default, alias = "pickUpAddress")]
    pub pickup_address: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_variant_id: VariantId,
    pub quantity: i32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_accepts_legacy_pickup_names() {
        let body = r#"{
            "billingAddress": "ABC street",
            "shippingMethodId": 1,
            "isPickUp": true,
            "pickUpAddress": "Store 4",
            "paymentStatus": "paid"
        }"#;
        let order: NewOrder = serde_json::from_str(body).unwrap();
        assert!(order.is_pickup);
        assert_eq!(order.pickup_address, "Store 4");
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_new_order_rejects_unknown_status() {
        let body = r#"{ "billingAddress": "x", "shippingMethodId": 1, "orderStatus": "lost" }"#;
        assert!(serde_json::from_str::<NewOrder>(body).is_err());
    }
}
