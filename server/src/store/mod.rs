use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::admin::{AdminAction, NewAdminAction, NewReport, Report, ReportResolution};
use crate::models::booking::{Booking, BookingDetails, NewBooking, ValidationUpdate};
use crate::models::checkout::{Checkout, CheckoutState, CheckoutUpdate, NewCheckout};
use crate::models::event::{Event, EventModeration, NewEvent};
use crate::models::profile::{Profile, UpdateProfileRequest, UserSummary};
use crate::models::role::{Role, RoleAssignment};

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    /// The attendee counter cannot grow by `requested` without passing the cap
    #[error("event {event_id} cannot take {requested} more attendee(s)")]
    CapacityExceeded { event_id: Uuid, requested: i32 },
    /// A conditional checkout write found the row in another state
    #[error("checkout {checkout_id} is {actual:?}, expected {expected:?}")]
    CheckoutStateChanged {
        checkout_id: Uuid,
        expected: CheckoutState,
        actual: CheckoutState,
    },
}

/// Storage for everything the ticketing server reads and writes.
///
/// Implementations must make [`Store::persist_booking`] and
/// [`Store::mark_validated`] atomic: the attendee counter never passes an
/// event's cap, and a validation timestamp is written at most once.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_active_events(&self) -> Result<Vec<Event>>;
    async fn list_all_events(&self) -> Result<Vec<Event>>;
    async fn event_by_id(&self, event_id: Uuid) -> Result<Event>;
    async fn create_event(&self, new_event: NewEvent) -> Result<Event>;
    async fn moderate_event(&self, event_id: Uuid, moderation: EventModeration) -> Result<Event>;

    /// Most recently assigned role, if the user has any assignment at all.
    async fn latest_role(&self, user_id: Uuid) -> Result<Option<Role>>;
    /// Inserts the default `user` role. Returns `false` when the user already
    /// holds a current role, which is not an error.
    async fn insert_default_role(&self, user_id: Uuid) -> Result<bool>;
    async fn assign_role(
        &self,
        user_id: Uuid,
        role: Role,
        assigned_by: Uuid,
    ) -> Result<RoleAssignment>;

    async fn create_checkout(&self, new_checkout: NewCheckout) -> Result<Checkout>;
    async fn checkout_by_order_id(&self, order_id: &str) -> Result<Checkout>;
    /// Applies `update` only while the checkout is still in `expected`,
    /// otherwise fails with [`StoreError::CheckoutStateChanged`] and writes
    /// nothing.
    async fn update_checkout(
        &self,
        checkout_id: Uuid,
        expected: CheckoutState,
        update: CheckoutUpdate,
    ) -> Result<Checkout>;
    async fn checkouts_in_state(&self, state: CheckoutState) -> Result<Vec<Checkout>>;

    /// Grows the event's attendee counter by `tickets` and inserts the booking
    /// in one step. Idempotent on `checkout_id`.
    async fn persist_booking(&self, new_booking: NewBooking) -> Result<Booking>;
    async fn booking_by_checkout(&self, checkout_id: Uuid) -> Result<Option<Booking>>;
    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<BookingDetails>>;
    async fn booking_by_qr(&self, qr_code: &str) -> Result<Option<BookingDetails>>;
    async fn mark_validated(
        &self,
        qr_code: &str,
        validator: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ValidationUpdate>;

    async fn profile_by_id(&self, user_id: Uuid) -> Result<Option<Profile>>;
    async fn upsert_profile(&self, user_id: Uuid, update: UpdateProfileRequest) -> Result<Profile>;
    async fn list_users(&self) -> Result<Vec<UserSummary>>;

    async fn record_admin_action(&self, action: NewAdminAction) -> Result<AdminAction>;
    async fn admin_actions(&self, limit: i64) -> Result<Vec<AdminAction>>;
    async fn create_report(&self, new_report: NewReport) -> Result<Report>;
    async fn list_reports(&self) -> Result<Vec<Report>>;
    async fn resolve_report(
        &self,
        report_id: Uuid,
        resolution: ReportResolution,
        resolved_by: Uuid,
    ) -> Result<Report>;
}
