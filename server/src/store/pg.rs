use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{query, query_as, query_scalar, PgPool};
use uuid::Uuid;

use crate::models::admin::{AdminAction, NewAdminAction, NewReport, Report, ReportResolution};
use crate::models::booking::{Booking, BookingDetails, NewBooking, ValidationUpdate};
use crate::models::checkout::{Checkout, CheckoutState, CheckoutUpdate, NewCheckout};
use crate::models::event::{Event, EventModeration, NewEvent};
use crate::models::profile::{Profile, UpdateProfileRequest, UserSummary};
use crate::models::role::{Role, RoleAssignment};
use crate::store::{Result, Store, StoreError};

const BOOKING_DETAILS_SELECT: &str = "
    SELECT
        b.*,
        e.title AS event_title,
        e.date AS event_date,
        e.time AS event_time,
        e.venue AS event_venue
    FROM bookings b
        INNER JOIN events e ON e.id = b.event_id";

/// A postgres store for the ticketing server
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}

#[async_trait]
impl Store for PgStore {
    async fn list_active_events(&self) -> Result<Vec<Event>> {
        let events = query_as::<_, Event>(
            "SELECT * FROM events WHERE status = 'active' ORDER BY date ASC, time ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn list_all_events(&self) -> Result<Vec<Event>> {
        let events = query_as::<_, Event>("SELECT * FROM events ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    async fn event_by_id(&self, event_id: Uuid) -> Result<Event> {
        query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                resource: "event",
                identifier: "id",
            })
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<Event> {
        let event = query_as::<_, Event>(
            "INSERT INTO events
                (id, title, description, date, time, venue, price, max_attendees,
                 category, image, organizer_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new_event.title)
        .bind(&new_event.description)
        .bind(new_event.date)
        .bind(new_event.time)
        .bind(&new_event.venue)
        .bind(new_event.price)
        .bind(new_event.max_attendees)
        .bind(&new_event.category)
        .bind(&new_event.image)
        .bind(new_event.organizer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    async fn moderate_event(&self, event_id: Uuid, moderation: EventModeration) -> Result<Event> {
        query_as::<_, Event>(
            "UPDATE events
             SET moderation_status = $2, moderated_by = $3, moderated_at = $4,
                 moderation_notes = $5, updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(event_id)
        .bind(moderation.status)
        .bind(moderation.moderator)
        .bind(moderation.at)
        .bind(&moderation.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            resource: "event",
            identifier: "id",
        })
    }

    async fn latest_role(&self, user_id: Uuid) -> Result<Option<Role>> {
        let role = query_scalar::<_, Role>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY assigned_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn insert_default_role(&self, user_id: Uuid) -> Result<bool> {
        let result = query(
            "INSERT INTO user_roles (id, user_id, role, is_current)
             VALUES ($1, $2, 'user', TRUE)
             ON CONFLICT DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn assign_role(
        &self,
        user_id: Uuid,
        role: Role,
        assigned_by: Uuid,
    ) -> Result<RoleAssignment> {
        let mut tx = self.pool.begin().await?;

        query("UPDATE user_roles SET is_current = FALSE WHERE user_id = $1 AND is_current")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let assignment = query_as::<_, RoleAssignment>(
            "INSERT INTO user_roles (id, user_id, role, assigned_by, is_current)
             VALUES ($1, $2, $3, $4, TRUE)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(role)
        .bind(assigned_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(assignment)
    }

    async fn create_checkout(&self, new_checkout: NewCheckout) -> Result<Checkout> {
        let checkout = query_as::<_, Checkout>(
            "INSERT INTO checkouts
                (id, user_id, event_id, tickets, total_amount, amount_minor, currency,
                 receipt, buyer_name, buyer_email, buyer_phone)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(new_checkout.id)
        .bind(new_checkout.user_id)
        .bind(new_checkout.event_id)
        .bind(new_checkout.tickets)
        .bind(new_checkout.total_amount)
        .bind(new_checkout.amount_minor)
        .bind(&new_checkout.currency)
        .bind(&new_checkout.receipt)
        .bind(&new_checkout.buyer_name)
        .bind(&new_checkout.buyer_email)
        .bind(&new_checkout.buyer_phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(checkout)
    }

    async fn checkout_by_order_id(&self, order_id: &str) -> Result<Checkout> {
        query_as::<_, Checkout>("SELECT * FROM checkouts WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                resource: "checkout",
                identifier: "order_id",
            })
    }

    async fn update_checkout(
        &self,
        checkout_id: Uuid,
        expected: CheckoutState,
        update: CheckoutUpdate,
    ) -> Result<Checkout> {
        let updated = query_as::<_, Checkout>(
            "UPDATE checkouts
             SET state = COALESCE($2, state),
                 order_id = COALESCE($3, order_id),
                 payment_id = COALESCE($4, payment_id),
                 failure_reason = COALESCE($5, failure_reason),
                 booking_id = COALESCE($6, booking_id),
                 updated_at = NOW()
             WHERE id = $1 AND state = $7
             RETURNING *",
        )
        .bind(checkout_id)
        .bind(update.state)
        .bind(&update.order_id)
        .bind(&update.payment_id)
        .bind(&update.failure_reason)
        .bind(update.booking_id)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(checkout) = updated {
            return Ok(checkout);
        }

        let actual: Option<CheckoutState> =
            query_scalar("SELECT state FROM checkouts WHERE id = $1")
                .bind(checkout_id)
                .fetch_optional(&self.pool)
                .await?;
        Err(match actual {
            Some(actual) => StoreError::CheckoutStateChanged {
                checkout_id,
                expected,
                actual,
            },
            None => StoreError::NotFound {
                resource: "checkout",
                identifier: "id",
            },
        })
    }

    async fn checkouts_in_state(&self, state: CheckoutState) -> Result<Vec<Checkout>> {
        let checkouts = query_as::<_, Checkout>(
            "SELECT * FROM checkouts WHERE state = $1 ORDER BY updated_at ASC",
        )
        .bind(state)
        .fetch_all(&self.pool)
        .await?;

        Ok(checkouts)
    }

    async fn persist_booking(&self, new_booking: NewBooking) -> Result<Booking> {
        if let Some(checkout_id) = new_booking.checkout_id {
            if let Some(existing) = self.booking_by_checkout(checkout_id).await? {
                return Ok(existing);
            }
        }

        let mut tx = self.pool.begin().await?;

        // The row lock taken here serializes concurrent buyers of the same event.
        let reserved = query(
            "UPDATE events
             SET current_attendees = current_attendees + $2, updated_at = NOW()
             WHERE id = $1
               AND status = 'active'
               AND (max_attendees IS NULL OR current_attendees + $2 <= max_attendees)",
        )
        .bind(new_booking.event_id)
        .bind(new_booking.tickets)
        .execute(&mut *tx)
        .await?;

        if reserved.rows_affected() == 0 {
            let bookable: Option<Uuid> =
                query_scalar("SELECT id FROM events WHERE id = $1 AND status = 'active'")
                    .bind(new_booking.event_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;

            return Err(match bookable {
                Some(_) => StoreError::CapacityExceeded {
                    event_id: new_booking.event_id,
                    requested: new_booking.tickets,
                },
                None => StoreError::NotFound {
                    resource: "event",
                    identifier: "id",
                },
            });
        }

        let inserted = query_as::<_, Booking>(
            "INSERT INTO bookings
                (id, user_id, event_id, checkout_id, tickets, total_amount, booking_code,
                 qr_code, buyer_name, buyer_email, buyer_phone, status, payment_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'confirmed', $12)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_booking.user_id)
        .bind(new_booking.event_id)
        .bind(new_booking.checkout_id)
        .bind(new_booking.tickets)
        .bind(new_booking.total_amount)
        .bind(&new_booking.booking_code)
        .bind(&new_booking.qr_code)
        .bind(&new_booking.buyer_name)
        .bind(&new_booking.buyer_email)
        .bind(&new_booking.buyer_phone)
        .bind(&new_booking.payment_id)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(booking) => {
                tx.commit().await?;
                Ok(booking)
            }
            Err(e) => {
                tx.rollback().await?;
                // A concurrent retry of the same checkout won the insert.
                if let (true, Some(checkout_id)) =
                    (is_unique_violation(&e), new_booking.checkout_id)
                {
                    if let Some(existing) = self.booking_by_checkout(checkout_id).await? {
                        return Ok(existing);
                    }
                }
                Err(StoreError::Database(e))
            }
        }
    }

    async fn booking_by_checkout(&self, checkout_id: Uuid) -> Result<Option<Booking>> {
        let booking = query_as::<_, Booking>("SELECT * FROM bookings WHERE checkout_id = $1")
            .bind(checkout_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<BookingDetails>> {
        let sql =
            format!("{BOOKING_DETAILS_SELECT} WHERE b.user_id = $1 ORDER BY b.created_at DESC");
        let bookings = query_as::<_, BookingDetails>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(bookings)
    }

    async fn booking_by_qr(&self, qr_code: &str) -> Result<Option<BookingDetails>> {
        let sql = format!("{BOOKING_DETAILS_SELECT} WHERE b.qr_code = $1");
        let booking = query_as::<_, BookingDetails>(&sql)
            .bind(qr_code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn mark_validated(
        &self,
        qr_code: &str,
        validator: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ValidationUpdate> {
        let updated: Option<Uuid> = query_scalar(
            "UPDATE bookings
             SET validated_at = $2, validated_by = $3, updated_at = NOW()
             WHERE qr_code = $1 AND validated_at IS NULL
             RETURNING id",
        )
        .bind(qr_code)
        .bind(at)
        .bind(validator)
        .fetch_optional(&self.pool)
        .await?;

        let details = self.booking_by_qr(qr_code).await?;

        Ok(match (updated, details) {
            (_, None) => ValidationUpdate::NotFound,
            (Some(_), Some(details)) => ValidationUpdate::Validated(details),
            (None, Some(details)) => ValidationUpdate::AlreadyValidated(details),
        })
    }

    async fn profile_by_id(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let profile = query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    async fn upsert_profile(&self, user_id: Uuid, update: UpdateProfileRequest) -> Result<Profile> {
        let profile = query_as::<_, Profile>(
            "INSERT INTO profiles
                (id, full_name, email, phone, organization, website, bio, avatar_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (id) DO UPDATE SET
                full_name = COALESCE(EXCLUDED.full_name, profiles.full_name),
                email = COALESCE(EXCLUDED.email, profiles.email),
                phone = COALESCE(EXCLUDED.phone, profiles.phone),
                organization = COALESCE(EXCLUDED.organization, profiles.organization),
                website = COALESCE(EXCLUDED.website, profiles.website),
                bio = COALESCE(EXCLUDED.bio, profiles.bio),
                avatar_url = COALESCE(EXCLUDED.avatar_url, profiles.avatar_url),
                updated_at = NOW()
             RETURNING *",
        )
        .bind(user_id)
        .bind(&update.full_name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.organization)
        .bind(&update.website)
        .bind(&update.bio)
        .bind(&update.avatar_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let users = query_as::<_, UserSummary>(
            "SELECT
                p.id, p.email, p.full_name, p.status,
                COALESCE(r.role, 'user') AS role,
                p.created_at
             FROM profiles p
                LEFT JOIN user_roles r ON r.user_id = p.id AND r.is_current
             ORDER BY p.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn record_admin_action(&self, action: NewAdminAction) -> Result<AdminAction> {
        let action = query_as::<_, AdminAction>(
            "INSERT INTO admin_actions (id, admin_id, action_type, target_type, target_id, details)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(action.admin_id)
        .bind(action.action_type)
        .bind(action.target_type)
        .bind(action.target_id)
        .bind(&action.details)
        .fetch_one(&self.pool)
        .await?;

        Ok(action)
    }

    async fn admin_actions(&self, limit: i64) -> Result<Vec<AdminAction>> {
        let actions = query_as::<_, AdminAction>(
            "SELECT * FROM admin_actions ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(actions)
    }

    async fn create_report(&self, new_report: NewReport) -> Result<Report> {
        let report = query_as::<_, Report>(
            "INSERT INTO user_reports
                (id, reporter_id, report_type, reported_user_id, reported_event_id, reason, details)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_report.reporter_id)
        .bind(new_report.report_type)
        .bind(new_report.reported_user_id)
        .bind(new_report.reported_event_id)
        .bind(&new_report.reason)
        .bind(&new_report.details)
        .fetch_one(&self.pool)
        .await?;

        Ok(report)
    }

    async fn list_reports(&self) -> Result<Vec<Report>> {
        let reports = query_as::<_, Report>("SELECT * FROM user_reports ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(reports)
    }

    async fn resolve_report(
        &self,
        report_id: Uuid,
        resolution: ReportResolution,
        resolved_by: Uuid,
    ) -> Result<Report> {
        query_as::<_, Report>(
            "UPDATE user_reports
             SET status = $2, resolved_by = $3, resolved_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(report_id)
        .bind(resolution.as_str())
        .bind(resolved_by)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            resource: "report",
            identifier: "id",
        })
    }
}
