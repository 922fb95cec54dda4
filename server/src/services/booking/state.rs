use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::checkout::CheckoutState;

/// Stages of one purchase, from the buyer opening the form to a stored booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingState {
    Idle,
    CollectingDetails,
    AwaitingPayment,
    Persisting,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStep {
    Start,
    DetailsAccepted { priced: bool },
    PaymentVerified,
    Persisted,
    Fail,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot apply {step:?} to a booking in state {from:?}")]
pub struct InvalidTransition {
    pub from: BookingState,
    pub step: BookingStep,
}

impl BookingState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingState::Complete | BookingState::Failed)
    }

    pub fn advance(self, step: BookingStep) -> Result<Self, InvalidTransition> {
        use BookingState::*;

        match (self, step) {
            (Idle, BookingStep::Start) => Ok(CollectingDetails),
            (CollectingDetails, BookingStep::DetailsAccepted { priced: true }) => {
                Ok(AwaitingPayment)
            }
            // Free events skip payment entirely.
            (CollectingDetails, BookingStep::DetailsAccepted { priced: false }) => Ok(Persisting),
            (AwaitingPayment, BookingStep::PaymentVerified) => Ok(Persisting),
            (Persisting, BookingStep::Persisted) => Ok(Complete),
            (state, BookingStep::Fail) if !state.is_terminal() => Ok(Failed),
            (from, step) => Err(InvalidTransition { from, step }),
        }
    }
}

impl From<CheckoutState> for BookingState {
    fn from(state: CheckoutState) -> Self {
        match state {
            CheckoutState::AwaitingPayment => BookingState::AwaitingPayment,
            CheckoutState::Persisting => BookingState::Persisting,
            CheckoutState::Complete => BookingState::Complete,
            CheckoutState::Failed => BookingState::Failed,
        }
    }
}

/// Tracks one workflow run and logs every transition.
#[derive(Debug)]
pub struct BookingFlow {
    state: BookingState,
    event_id: Uuid,
    checkout_id: Option<Uuid>,
}

impl BookingFlow {
    pub fn start(event_id: Uuid) -> Result<Self, InvalidTransition> {
        let mut flow = Self {
            state: BookingState::Idle,
            event_id,
            checkout_id: None,
        };
        flow.advance(BookingStep::Start)?;
        Ok(flow)
    }

    /// Picks up a checkout persisted by an earlier request.
    pub fn resume(event_id: Uuid, checkout_id: Uuid, state: CheckoutState) -> Self {
        Self {
            state: state.into(),
            event_id,
            checkout_id: Some(checkout_id),
        }
    }

    pub fn state(&self) -> BookingState {
        self.state
    }

    pub fn attach_checkout(&mut self, checkout_id: Uuid) {
        self.checkout_id = Some(checkout_id);
    }

    pub fn advance(&mut self, step: BookingStep) -> Result<BookingState, InvalidTransition> {
        let from = self.state;
        self.state = from.advance(step)?;
        debug!(
            event_id = %self.event_id,
            checkout_id = ?self.checkout_id,
            from = ?from,
            to = ?self.state,
            "Booking transition"
        );
        Ok(self.state)
    }

    /// Moves to `Failed`; a flow that already finished is left alone.
    pub fn fail(&mut self, reason: &str) {
        if self.state.is_terminal() {
            return;
        }
        info!(
            event_id = %self.event_id,
            checkout_id = ?self.checkout_id,
            from = ?self.state,
            reason,
            "Booking failed"
        );
        self.state = BookingState::Failed;
    }
}
