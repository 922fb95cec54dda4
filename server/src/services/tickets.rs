use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::booking::{BookingDetails, ValidationUpdate};
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

/// Result of scanning a QR token at the door. An unknown token is an outcome,
/// not an error.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TicketOutcome {
    NotFound,
    Found { ticket: BookingDetails },
    Validated { ticket: BookingDetails },
    AlreadyValidated { ticket: BookingDetails },
}

#[derive(Clone)]
pub struct TicketValidator {
    store: Arc<dyn Store>,
}

impl TicketValidator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Read-only lookup by exact token.
    pub async fn lookup(&self, qr_code: &str) -> AppResult<TicketOutcome> {
        let qr_code = normalize(qr_code)?;
        let outcome = match self.store.booking_by_qr(qr_code).await? {
            Some(ticket) => TicketOutcome::Found { ticket },
            None => TicketOutcome::NotFound,
        };
        Ok(outcome)
    }

    /// Admits the ticket holder. The validation timestamp is written once;
    /// later scans report the original one.
    pub async fn validate(&self, qr_code: &str, operator: Uuid) -> AppResult<TicketOutcome> {
        let qr_code = normalize(qr_code)?;
        let outcome = match self.store.mark_validated(qr_code, operator, Utc::now()).await? {
            ValidationUpdate::NotFound => {
                warn!(%operator, "Validation attempted for unknown ticket");
                TicketOutcome::NotFound
            }
            ValidationUpdate::Validated(ticket) => {
                info!(
                    booking_id = %ticket.booking.id,
                    event_id = %ticket.booking.event_id,
                    %operator,
                    "Ticket validated"
                );
                TicketOutcome::Validated { ticket }
            }
            ValidationUpdate::AlreadyValidated(ticket) => {
                warn!(
                    booking_id = %ticket.booking.id,
                    validated_at = ?ticket.booking.validated_at,
                    "Ticket was already validated"
                );
                TicketOutcome::AlreadyValidated { ticket }
            }
        };
        Ok(outcome)
    }
}

fn normalize(qr_code: &str) -> AppResult<&str> {
    let qr_code = qr_code.trim();
    if qr_code.is_empty() {
        return Err(AppError::ValidationError("QR code is required".to_string()));
    }
    Ok(qr_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::NewBooking;
    use crate::models::event::fixtures::event;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    async fn seeded() -> (Arc<MemoryStore>, String) {
        let store = Arc::new(MemoryStore::new());
        let event = event(Decimal::ZERO, None, 0);
        let event_id = event.id;
        store.insert_event(event);
        let booking = store
            .persist_booking(NewBooking {
                user_id: Uuid::new_v4(),
                event_id,
                checkout_id: None,
                tickets: 1,
                total_amount: Decimal::ZERO,
                booking_code: "BK-TESTCODE".to_string(),
                qr_code: "qr-token-1".to_string(),
                buyer_name: "Ada".to_string(),
                buyer_email: "ada@example.com".to_string(),
                buyer_phone: None,
                payment_id: None,
            })
            .await
            .unwrap();
        (store, booking.qr_code)
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let (store, _) = seeded().await;
        let validator = TicketValidator::new(store);

        let outcome = validator.validate("nope", Uuid::new_v4()).await.unwrap();
        assert!(matches!(outcome, TicketOutcome::NotFound));
        let outcome = validator.lookup("nope").await.unwrap();
        assert!(matches!(outcome, TicketOutcome::NotFound));
    }

    #[tokio::test]
    async fn test_second_validation_keeps_first_timestamp() {
        let (store, qr) = seeded().await;
        let validator = TicketValidator::new(store);
        let first_operator = Uuid::new_v4();

        let first = match validator.validate(&qr, first_operator).await.unwrap() {
            TicketOutcome::Validated { ticket } => ticket,
            other => panic!("unexpected outcome: {other:?}"),
        };
        let second = match validator.validate(&qr, Uuid::new_v4()).await.unwrap() {
            TicketOutcome::AlreadyValidated { ticket } => ticket,
            other => panic!("unexpected outcome: {other:?}"),
        };

        assert_eq!(first.booking.validated_at, second.booking.validated_at);
        assert_eq!(second.booking.validated_by, Some(first_operator));
    }

    #[tokio::test]
    async fn test_lookup_does_not_validate() {
        let (store, qr) = seeded().await;
        let validator = TicketValidator::new(store);

        match validator.lookup(&qr).await.unwrap() {
            TicketOutcome::Found { ticket } => assert!(!ticket.booking.is_validated()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_token_is_rejected() {
        let (store, _) = seeded().await;
        let validator = TicketValidator::new(store);
        assert!(matches!(
            validator.lookup("   ").await,
            Err(AppError::ValidationError(_))
        ));
    }
}
