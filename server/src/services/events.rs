use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::models::event::{CreateEventRequest, Event, EventStatus, NewEvent};
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn Store>,
}

impl EventService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_active(&self) -> AppResult<Vec<Event>> {
        Ok(self.store.list_active_events().await?)
    }

    /// Public view of one event; inactive events are hidden.
    pub async fn get_active(&self, event_id: Uuid) -> AppResult<Event> {
        let event = self.store.event_by_id(event_id).await?;
        if event.status != EventStatus::Active {
            return Err(AppError::NotFound(format!("event {event_id} was not found")));
        }
        Ok(event)
    }

    pub async fn create(&self, organizer_id: Uuid, request: CreateEventRequest) -> AppResult<Event> {
        let new_event = validate_event(organizer_id, request)?;
        let event = self.store.create_event(new_event).await?;
        info!(event_id = %event.id, %organizer_id, "Event created");
        Ok(event)
    }
}

fn required(value: String, field: &str) -> AppResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(value)
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_event(organizer_id: Uuid, request: CreateEventRequest) -> AppResult<NewEvent> {
    let price = request.price.unwrap_or(Decimal::ZERO);
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::ValidationError(
            "Price cannot be negative".to_string(),
        ));
    }
    if matches!(request.max_attendees, Some(max) if max < 1) {
        return Err(AppError::ValidationError(
            "Maximum attendees must be at least 1".to_string(),
        ));
    }

    Ok(NewEvent {
        title: required(request.title, "Title")?,
        description: optional(request.description),
        date: request.date,
        time: request.time,
        venue: required(request.venue, "Venue")?,
        price: price.round_dp(2),
        max_attendees: request.max_attendees,
        category: optional(request.category),
        image: optional(request.image),
        organizer_id,
    })
}
