use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::booking::BookingReceipt;

/// Body accepted by the order endpoint; `amount` is in major currency units.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: Decimal,
    pub currency: String,
    pub receipt: String,
}

/// Body sent to the gateway; `amount` is in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// Order object as returned by the gateway. Unknown fields are kept so the
/// order can be handed back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tokens the checkout UI hands back after a successful payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// Everything the external checkout UI needs to collect a payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentCheckout {
    pub checkout_id: Uuid,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub key_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    /// Free events skip payment and are booked immediately.
    Complete { booking: BookingReceipt },
    AwaitingPayment { payment: PaymentCheckout },
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub examined: usize,
    pub completed: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_order_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "id": "order_EKwxwAgItmmXdp",
            "entity": "order",
            "amount": 20000,
            "amount_paid": 0,
            "currency": "INR",
            "receipt": "rcpt_1",
            "status": "created"
        });

        let order: GatewayOrder = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(order.amount, 20000);
        assert_eq!(order.extra["status"], "created");
        assert_eq!(serde_json::to_value(&order).unwrap(), raw);
    }

    #[test]
    fn test_order_request_accepts_numeric_amount() {
        let req: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "amount": 100.5,
            "currency": "INR",
            "receipt": "r1"
        }))
        .unwrap();
        assert_eq!(req.amount, Decimal::new(1005, 1));
    }
}
