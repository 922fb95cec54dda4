use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub checkout_id: Option<Uuid>,
    pub tickets: i32,
    pub total_amount: Decimal,
    pub booking_code: String,
    pub qr_code: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: Option<String>,
    pub status: BookingStatus,
    pub payment_id: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub validated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_validated(&self) -> bool {
        self.validated_at.is_some()
    }
}

/// A booking joined with the event fields shown on tickets and booking lists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub event_title: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub event_venue: String,
}

/// Insert payload for a confirmed booking.
///
/// `tickets` is also the amount the event's attendee counter grows by, and the
/// insert is refused when that would exceed the event's capacity.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub checkout_id: Option<Uuid>,
    pub tickets: i32,
    pub total_amount: Decimal,
    pub booking_code: String,
    pub qr_code: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: Option<String>,
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub tickets: i32,
    pub buyer_name: String,
    pub buyer_email: String,
    #[serde(default)]
    pub buyer_phone: Option<String>,
}

/// What the buyer gets back once a booking exists.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingReceipt {
    pub booking_id: Uuid,
    pub event_id: Uuid,
    pub booking_code: String,
    pub qr_code: String,
    pub tickets: i32,
    pub total_amount: Decimal,
}

impl From<&Booking> for BookingReceipt {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            event_id: booking.event_id,
            booking_code: booking.booking_code.clone(),
            qr_code: booking.qr_code.clone(),
            tickets: booking.tickets,
            total_amount: booking.total_amount,
        }
    }
}

/// Result of the one-way `Unvalidated -> Validated` transition.
#[derive(Debug, Clone)]
pub enum ValidationUpdate {
    NotFound,
    Validated(BookingDetails),
    AlreadyValidated(BookingDetails),
}
