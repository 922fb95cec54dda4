use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Durable part of the booking workflow, one row per priced purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "checkout_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    AwaitingPayment,
    /// Payment verified, booking not yet written.
    Persisting,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Checkout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub tickets: i32,
    pub total_amount: Decimal,
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
    pub order_id: Option<String>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: Option<String>,
    pub state: CheckoutState,
    pub payment_id: Option<String>,
    pub failure_reason: Option<String>,
    pub booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCheckout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub tickets: i32,
    pub total_amount: Decimal,
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: Option<String>,
}

/// Partial update of a checkout row. `None` fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct CheckoutUpdate {
    pub state: Option<CheckoutState>,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub failure_reason: Option<String>,
    pub booking_id: Option<Uuid>,
}

impl CheckoutUpdate {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: Some(CheckoutState::Failed),
            failure_reason: Some(reason.into()),
            ..Self::default()
        }
    }
}
