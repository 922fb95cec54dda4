use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Largest number of tickets a single purchase may include.
pub const MAX_TICKETS_PER_PURCHASE: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Active,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "moderation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub venue: String,
    pub price: Decimal,
    pub max_attendees: Option<i32>,
    pub current_attendees: i32,
    pub category: Option<String>,
    pub image: Option<String>,
    pub organizer_id: Uuid,
    pub status: EventStatus,
    pub moderation_status: ModerationStatus,
    pub moderated_by: Option<Uuid>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderation_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }

    /// Seats still available, `None` when the event has no attendee cap.
    pub fn capacity_remaining(&self) -> Option<i32> {
        self.max_attendees
            .map(|max| (max - self.current_attendees).max(0))
    }

    /// Upper bound on the quantity a buyer may select right now.
    pub fn max_tickets_per_purchase(&self) -> i32 {
        match self.capacity_remaining() {
            Some(remaining) => remaining.min(MAX_TICKETS_PER_PURCHASE),
            None => MAX_TICKETS_PER_PURCHASE,
        }
    }
}

/// Columns needed to insert an event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub venue: String,
    pub price: Decimal,
    pub max_attendees: Option<i32>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub organizer_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub venue: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    pub max_attendees: Option<i32>,
    pub category: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EventModeration {
    pub status: ModerationStatus,
    pub moderator: Uuid,
    pub notes: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerateEventRequest {
    pub status: ModerationStatus,
    pub notes: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn event(price: Decimal, max_attendees: Option<i32>, current_attendees: i32) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: "Rust Meetup".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2030, 5, 17).unwrap(),
            time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            venue: "Hall A".to_string(),
            price,
            max_attendees,
            current_attendees,
            category: None,
            image: None,
            organizer_id: Uuid::new_v4(),
            status: EventStatus::Active,
            moderation_status: ModerationStatus::Pending,
            moderated_by: None,
            moderated_at: None,
            moderation_notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}
