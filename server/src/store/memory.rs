use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::admin::{AdminAction, NewAdminAction, NewReport, Report, ReportResolution};
use crate::models::booking::{
    Booking, BookingDetails, BookingStatus, NewBooking, ValidationUpdate,
};
use crate::models::checkout::{Checkout, CheckoutState, CheckoutUpdate, NewCheckout};
use crate::models::event::{Event, EventModeration, EventStatus, ModerationStatus, NewEvent};
use crate::models::profile::{Profile, UpdateProfileRequest, UserSummary};
use crate::models::role::{Role, RoleAssignment};
use crate::store::{Result, Store, StoreError};

#[derive(Default)]
struct Tables {
    events: Vec<Event>,
    roles: Vec<RoleAssignment>,
    checkouts: Vec<Checkout>,
    bookings: Vec<Booking>,
    profiles: Vec<Profile>,
    admin_actions: Vec<AdminAction>,
    reports: Vec<Report>,
}

impl Tables {
    fn details(&self, booking: &Booking) -> Option<BookingDetails> {
        let event = self.events.iter().find(|e| e.id == booking.event_id)?;
        Some(BookingDetails {
            booking: booking.clone(),
            event_title: event.title.clone(),
            event_date: event.date,
            event_time: event.time,
            event_venue: event.venue.clone(),
        })
    }
}

/// A store kept entirely in process memory.
///
/// Every operation runs under one lock, which gives the same atomicity as the
/// transactional postgres store. Used by the test suite and for local runs
/// without a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_role_inserts: AtomicBool,
    fail_order_id_writes: AtomicBool,
    failed_write_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an event row as-is.
    pub fn insert_event(&self, event: Event) {
        self.tables.lock().events.push(event);
    }

    /// Makes [`Store::insert_default_role`] fail, to exercise callers that
    /// must tolerate a broken default-role write.
    pub fn fail_role_inserts(&self, fail: bool) {
        self.fail_role_inserts.store(fail, Ordering::SeqCst);
    }

    /// Makes checkout writes that record a gateway order id fail.
    pub fn fail_order_id_writes(&self, fail: bool) {
        self.fail_order_id_writes.store(fail, Ordering::SeqCst);
    }

    /// Holds every write that moves a checkout to `failed` for `delay` before
    /// it takes the lock, so a concurrent request can overtake it.
    pub fn delay_failed_writes(&self, delay: Duration) {
        *self.failed_write_delay.lock() = Some(delay);
    }

    pub fn role_rows(&self, user_id: Uuid) -> Vec<RoleAssignment> {
        self.tables
            .lock()
            .roles
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn booking_count(&self) -> usize {
        self.tables.lock().bookings.len()
    }

    pub fn checkouts(&self) -> Vec<Checkout> {
        self.tables.lock().checkouts.clone()
    }
}

fn not_found(resource: &'static str, identifier: &'static str) -> StoreError {
    StoreError::NotFound {
        resource,
        identifier,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_active_events(&self) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .tables
            .lock()
            .events
            .iter()
            .filter(|e| e.status == EventStatus::Active)
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.date, e.time));
        Ok(events)
    }

    async fn list_all_events(&self) -> Result<Vec<Event>> {
        let mut events = self.tables.lock().events.clone();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn event_by_id(&self, event_id: Uuid) -> Result<Event> {
        self.tables
            .lock()
            .events
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(|| not_found("event", "id"))
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<Event> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: new_event.title,
            description: new_event.description,
            date: new_event.date,
            time: new_event.time,
            venue: new_event.venue,
            price: new_event.price,
            max_attendees: new_event.max_attendees,
            current_attendees: 0,
            category: new_event.category,
            image: new_event.image,
            organizer_id: new_event.organizer_id,
            status: EventStatus::Active,
            moderation_status: ModerationStatus::Pending,
            moderated_by: None,
            moderated_at: None,
            moderation_notes: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().events.push(event.clone());
        Ok(event)
    }

    async fn moderate_event(&self, event_id: Uuid, moderation: EventModeration) -> Result<Event> {
        let mut tables = self.tables.lock();
        let event = tables
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| not_found("event", "id"))?;

        event.moderation_status = moderation.status;
        event.moderated_by = Some(moderation.moderator);
        event.moderated_at = Some(moderation.at);
        event.moderation_notes = moderation.notes;
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn latest_role(&self, user_id: Uuid) -> Result<Option<Role>> {
        Ok(self
            .tables
            .lock()
            .roles
            .iter()
            .filter(|r| r.user_id == user_id)
            .max_by_key(|r| r.assigned_at)
            .map(|r| r.role))
    }

    async fn insert_default_role(&self, user_id: Uuid) -> Result<bool> {
        if self.fail_role_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut tables = self.tables.lock();
        if tables
            .roles
            .iter()
            .any(|r| r.user_id == user_id && r.is_current)
        {
            return Ok(false);
        }

        tables.roles.push(RoleAssignment {
            id: Uuid::new_v4(),
            user_id,
            role: Role::User,
            assigned_by: None,
            assigned_at: Utc::now(),
            is_current: true,
        });
        Ok(true)
    }

    async fn assign_role(
        &self,
        user_id: Uuid,
        role: Role,
        assigned_by: Uuid,
    ) -> Result<RoleAssignment> {
        let mut tables = self.tables.lock();
        for row in tables.roles.iter_mut().filter(|r| r.user_id == user_id) {
            row.is_current = false;
        }

        let assignment = RoleAssignment {
            id: Uuid::new_v4(),
            user_id,
            role,
            assigned_by: Some(assigned_by),
            assigned_at: Utc::now(),
            is_current: true,
        };
        tables.roles.push(assignment.clone());
        Ok(assignment)
    }

    async fn create_checkout(&self, new_checkout: NewCheckout) -> Result<Checkout> {
        let now = Utc::now();
        let checkout = Checkout {
            id: new_checkout.id,
            user_id: new_checkout.user_id,
            event_id: new_checkout.event_id,
            tickets: new_checkout.tickets,
            total_amount: new_checkout.total_amount,
            amount_minor: new_checkout.amount_minor,
            currency: new_checkout.currency,
            receipt: new_checkout.receipt,
            order_id: None,
            buyer_name: new_checkout.buyer_name,
            buyer_email: new_checkout.buyer_email,
            buyer_phone: new_checkout.buyer_phone,
            state: CheckoutState::AwaitingPayment,
            payment_id: None,
            failure_reason: None,
            booking_id: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().checkouts.push(checkout.clone());
        Ok(checkout)
    }

    async fn checkout_by_order_id(&self, order_id: &str) -> Result<Checkout> {
        self.tables
            .lock()
            .checkouts
            .iter()
            .find(|c| c.order_id.as_deref() == Some(order_id))
            .cloned()
            .ok_or_else(|| not_found("checkout", "order_id"))
    }

    async fn update_checkout(
        &self,
        checkout_id: Uuid,
        expected: CheckoutState,
        update: CheckoutUpdate,
    ) -> Result<Checkout> {
        if update.order_id.is_some() && self.fail_order_id_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let delay = *self.failed_write_delay.lock();
        if let (Some(delay), Some(CheckoutState::Failed)) = (delay, update.state) {
            tokio::time::sleep(delay).await;
        }

        let mut tables = self.tables.lock();
        let checkout = tables
            .checkouts
            .iter_mut()
            .find(|c| c.id == checkout_id)
            .ok_or_else(|| not_found("checkout", "id"))?;
        if checkout.state != expected {
            return Err(StoreError::CheckoutStateChanged {
                checkout_id,
                expected,
                actual: checkout.state,
            });
        }

        if let Some(state) = update.state {
            checkout.state = state;
        }
        if update.order_id.is_some() {
            checkout.order_id = update.order_id;
        }
        if update.payment_id.is_some() {
            checkout.payment_id = update.payment_id;
        }
        if update.failure_reason.is_some() {
            checkout.failure_reason = update.failure_reason;
        }
        if update.booking_id.is_some() {
            checkout.booking_id = update.booking_id;
        }
        checkout.updated_at = Utc::now();
        Ok(checkout.clone())
    }

    async fn checkouts_in_state(&self, state: CheckoutState) -> Result<Vec<Checkout>> {
        Ok(self
            .tables
            .lock()
            .checkouts
            .iter()
            .filter(|c| c.state == state)
            .cloned()
            .collect())
    }

    async fn persist_booking(&self, new_booking: NewBooking) -> Result<Booking> {
        let mut tables = self.tables.lock();

        if let Some(checkout_id) = new_booking.checkout_id {
            if let Some(existing) = tables
                .bookings
                .iter()
                .find(|b| b.checkout_id == Some(checkout_id))
            {
                return Ok(existing.clone());
            }
        }

        let event = tables
            .events
            .iter_mut()
            .find(|e| e.id == new_booking.event_id && e.status == EventStatus::Active)
            .ok_or_else(|| not_found("event", "id"))?;

        let attendees = event.current_attendees + new_booking.tickets;
        if matches!(event.max_attendees, Some(max) if attendees > max) {
            return Err(StoreError::CapacityExceeded {
                event_id: event.id,
                requested: new_booking.tickets,
            });
        }
        event.current_attendees = attendees;

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: new_booking.user_id,
            event_id: new_booking.event_id,
            checkout_id: new_booking.checkout_id,
            tickets: new_booking.tickets,
            total_amount: new_booking.total_amount,
            booking_code: new_booking.booking_code,
            qr_code: new_booking.qr_code,
            buyer_name: new_booking.buyer_name,
            buyer_email: new_booking.buyer_email,
            buyer_phone: new_booking.buyer_phone,
            status: BookingStatus::Confirmed,
            payment_id: new_booking.payment_id,
            validated_at: None,
            validated_by: None,
            created_at: now,
            updated_at: now,
        };
        tables.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn booking_by_checkout(&self, checkout_id: Uuid) -> Result<Option<Booking>> {
        let tables = self.tables.lock();
        Ok(tables
            .bookings
            .iter()
            .find(|b| b.checkout_id == Some(checkout_id))
            .cloned())
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<BookingDetails>> {
        let tables = self.tables.lock();
        let mut bookings: Vec<BookingDetails> = tables
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| tables.details(b))
            .collect();
        bookings.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        Ok(bookings)
    }

    async fn booking_by_qr(&self, qr_code: &str) -> Result<Option<BookingDetails>> {
        let tables = self.tables.lock();
        Ok(tables
            .bookings
            .iter()
            .find(|b| b.qr_code == qr_code)
            .and_then(|b| tables.details(b)))
    }

    async fn mark_validated(
        &self,
        qr_code: &str,
        validator: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ValidationUpdate> {
        let mut tables = self.tables.lock();
        let Some(index) = tables.bookings.iter().position(|b| b.qr_code == qr_code) else {
            return Ok(ValidationUpdate::NotFound);
        };

        let newly_validated = {
            let booking = &mut tables.bookings[index];
            if booking.validated_at.is_none() {
                booking.validated_at = Some(at);
                booking.validated_by = Some(validator);
                booking.updated_at = Utc::now();
                true
            } else {
                false
            }
        };

        let booking = tables.bookings[index].clone();
        Ok(match tables.details(&booking) {
            None => ValidationUpdate::NotFound,
            Some(details) if newly_validated => ValidationUpdate::Validated(details),
            Some(details) => ValidationUpdate::AlreadyValidated(details),
        })
    }

    async fn profile_by_id(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self
            .tables
            .lock()
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .cloned())
    }

    async fn upsert_profile(&self, user_id: Uuid, update: UpdateProfileRequest) -> Result<Profile> {
        let mut tables = self.tables.lock();
        let now = Utc::now();

        let index = match tables.profiles.iter().position(|p| p.id == user_id) {
            Some(index) => index,
            None => {
                tables.profiles.push(Profile {
                    id: user_id,
                    full_name: None,
                    email: None,
                    phone: None,
                    organization: None,
                    website: None,
                    bio: None,
                    avatar_url: None,
                    status: "active".to_string(),
                    created_at: now,
                    updated_at: now,
                });
                tables.profiles.len() - 1
            }
        };

        let profile = &mut tables.profiles[index];
        let UpdateProfileRequest {
            full_name,
            email,
            phone,
            organization,
            website,
            bio,
            avatar_url,
        } = update;
        profile.full_name = full_name.or(profile.full_name.take());
        profile.email = email.or(profile.email.take());
        profile.phone = phone.or(profile.phone.take());
        profile.organization = organization.or(profile.organization.take());
        profile.website = website.or(profile.website.take());
        profile.bio = bio.or(profile.bio.take());
        profile.avatar_url = avatar_url.or(profile.avatar_url.take());
        profile.updated_at = now;
        Ok(profile.clone())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let tables = self.tables.lock();
        let mut users: Vec<UserSummary> = tables
            .profiles
            .iter()
            .map(|p| UserSummary {
                id: p.id,
                email: p.email.clone(),
                full_name: p.full_name.clone(),
                status: p.status.clone(),
                role: tables
                    .roles
                    .iter()
                    .find(|r| r.user_id == p.id && r.is_current)
                    .map(|r| r.role)
                    .unwrap_or(Role::User),
                created_at: p.created_at,
            })
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn record_admin_action(&self, action: NewAdminAction) -> Result<AdminAction> {
        let action = AdminAction {
            id: Uuid::new_v4(),
            admin_id: action.admin_id,
            action_type: action.action_type.to_string(),
            target_type: action.target_type.to_string(),
            target_id: action.target_id,
            details: action.details,
            created_at: Utc::now(),
        };
        self.tables.lock().admin_actions.push(action.clone());
        Ok(action)
    }

    async fn admin_actions(&self, limit: i64) -> Result<Vec<AdminAction>> {
        let tables = self.tables.lock();
        Ok(tables
            .admin_actions
            .iter()
            .rev()
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn create_report(&self, new_report: NewReport) -> Result<Report> {
        let report = Report {
            id: Uuid::new_v4(),
            reporter_id: new_report.reporter_id,
            report_type: new_report.report_type.to_string(),
            reported_user_id: new_report.reported_user_id,
            reported_event_id: new_report.reported_event_id,
            reason: new_report.reason,
            details: new_report.details,
            status: "pending".to_string(),
            resolved_by: None,
            resolved_at: None,
            created_at: Utc::now(),
        };
        self.tables.lock().reports.push(report.clone());
        Ok(report)
    }

    async fn list_reports(&self) -> Result<Vec<Report>> {
        let tables = self.tables.lock();
        Ok(tables.reports.iter().rev().cloned().collect())
    }

    async fn resolve_report(
        &self,
        report_id: Uuid,
        resolution: ReportResolution,
        resolved_by: Uuid,
    ) -> Result<Report> {
        let mut tables = self.tables.lock();
        let report = tables
            .reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or_else(|| not_found("report", "id"))?;

        report.status = resolution.as_str().to_string();
        report.resolved_by = Some(resolved_by);
        report.resolved_at = Some(Utc::now());
        Ok(report.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::fixtures::event;
    use rust_decimal::Decimal;

    fn new_booking(event_id: Uuid, tickets: i32, checkout_id: Option<Uuid>) -> NewBooking {
        NewBooking {
            user_id: Uuid::new_v4(),
            event_id,
            checkout_id,
            tickets,
            total_amount: Decimal::ZERO,
            booking_code: crate::utils::codes::booking_code(),
            qr_code: crate::utils::codes::qr_token(),
            buyer_name: "Ada".to_string(),
            buyer_email: "ada@example.com".to_string(),
            buyer_phone: None,
            payment_id: None,
        }
    }

    #[tokio::test]
    async fn test_persist_booking_respects_capacity() {
        let store = MemoryStore::new();
        let event = event(Decimal::ZERO, Some(3), 1);
        let event_id = event.id;
        store.insert_event(event);

        store
            .persist_booking(new_booking(event_id, 2, None))
            .await
            .unwrap();
        let err = store
            .persist_booking(new_booking(event_id, 1, None))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::CapacityExceeded { requested: 1, .. }));
        assert_eq!(store.event_by_id(event_id).await.unwrap().current_attendees, 3);
    }

    #[tokio::test]
    async fn test_persist_booking_is_idempotent_per_checkout() {
        let store = MemoryStore::new();
        let event = event(Decimal::ZERO, None, 0);
        let event_id = event.id;
        store.insert_event(event);
        let checkout_id = Some(Uuid::new_v4());

        let first = store
            .persist_booking(new_booking(event_id, 2, checkout_id))
            .await
            .unwrap();
        let second = store
            .persist_booking(new_booking(event_id, 2, checkout_id))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.booking_count(), 1);
        assert_eq!(store.event_by_id(event_id).await.unwrap().current_attendees, 2);
    }

    #[tokio::test]
    async fn test_checkout_update_requires_expected_state() {
        let store = MemoryStore::new();
        let checkout = store
            .create_checkout(NewCheckout {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                event_id: Uuid::new_v4(),
                tickets: 1,
                total_amount: Decimal::new(10000, 2),
                amount_minor: 10000,
                currency: "INR".to_string(),
                receipt: "rcpt_1".to_string(),
                buyer_name: "Ada".to_string(),
                buyer_email: "ada@example.com".to_string(),
                buyer_phone: None,
            })
            .await
            .unwrap();
        store
            .update_checkout(
                checkout.id,
                CheckoutState::AwaitingPayment,
                CheckoutUpdate {
                    state: Some(CheckoutState::Complete),
                    ..CheckoutUpdate::default()
                },
            )
            .await
            .unwrap();

        let err = store
            .update_checkout(
                checkout.id,
                CheckoutState::AwaitingPayment,
                CheckoutUpdate::failed("cancelled by user"),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::CheckoutStateChanged {
                actual: CheckoutState::Complete,
                ..
            }
        ));
        let stored = &store.checkouts()[0];
        assert_eq!(stored.state, CheckoutState::Complete);
        assert_eq!(stored.failure_reason, None);
    }

    #[tokio::test]
    async fn test_default_role_insert_is_once_only() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        assert!(store.insert_default_role(user).await.unwrap());
        assert!(!store.insert_default_role(user).await.unwrap());
        assert_eq!(store.role_rows(user).len(), 1);
    }
}
