use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::admin::{NewAdminAction, ACTION_CHECKOUT_RECONCILIATION};
use crate::models::booking::{Booking, BookingReceipt, BookingRequest, NewBooking};
use crate::models::checkout::{Checkout, CheckoutState, CheckoutUpdate, NewCheckout};
use crate::models::event::{Event, EventStatus};
use crate::models::payment::{
    CheckoutOutcome, CreateOrderRequest, PaymentCallback, PaymentCheckout, ReconcileSummary,
};
use crate::services::payments::{initiate_order, PaymentGateway, SignatureVerifier};
use crate::store::{Store, StoreError};
use crate::utils::codes;
use crate::utils::error::{AppError, AppResult};
use crate::utils::money::{line_total, to_minor_units};

mod state;
pub use state::*;

const REASON_SIGNATURE_MISMATCH: &str = "signature mismatch";
const REASON_CANCELLED: &str = "cancelled by user";
const REASON_CAPACITY_AFTER_PAYMENT: &str = "capacity exhausted after payment";
const REASON_EVENT_GONE: &str = "event no longer bookable";
const REASON_ORDER_NOT_RECORDED: &str = "gateway order could not be recorded";

/// Buyer input after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerDetails {
    pub tickets: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Checks a purchase request against the event before anything is written
/// or any gateway call is made.
pub fn validate_request(event: &Event, request: BookingRequest) -> AppResult<BuyerDetails> {
    if event.status != EventStatus::Active {
        return Err(AppError::ValidationError(
            "This event is not open for booking".to_string(),
        ));
    }

    let max_tickets = event.max_tickets_per_purchase();
    if max_tickets == 0 {
        return Err(AppError::ValidationError(
            "This event is sold out".to_string(),
        ));
    }
    if request.tickets < 1 || request.tickets > max_tickets {
        return Err(AppError::ValidationError(format!(
            "Ticket quantity must be between 1 and {max_tickets}"
        )));
    }

    let name = request.buyer_name.trim();
    if name.is_empty() {
        return Err(AppError::ValidationError("Buyer name is required".to_string()));
    }
    let email = request.buyer_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::ValidationError(
            "A valid buyer email is required".to_string(),
        ));
    }
    let phone = request
        .buyer_phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    Ok(BuyerDetails {
        tickets: request.tickets,
        name: name.to_string(),
        email: email.to_string(),
        phone,
    })
}

/// Drives a purchase from the buyer's form to a stored booking.
///
/// Free events are booked in one call. Priced events go through a durable
/// checkout row: [`BookingService::begin_checkout`] creates the gateway order,
/// [`BookingService::confirm_payment`] verifies the callback and writes the
/// booking. The booking write is keyed on the checkout, so replaying a
/// confirmation never books twice.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    verifier: Arc<SignatureVerifier>,
    currency: String,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        verifier: Arc<SignatureVerifier>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            verifier,
            currency: currency.into(),
        }
    }

    pub async fn begin_checkout(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        request: BookingRequest,
    ) -> AppResult<CheckoutOutcome> {
        let mut flow = BookingFlow::start(event_id)?;

        let event = match self.store.event_by_id(event_id).await {
            Ok(event) => event,
            Err(e) => {
                flow.fail("event lookup failed");
                return Err(e.into());
            }
        };
        let buyer = match validate_request(&event, request) {
            Ok(buyer) => buyer,
            Err(e) => {
                flow.fail("invalid booking details");
                return Err(e);
            }
        };
        let total = line_total(event.price, buyer.tickets);

        if event.is_free() {
            flow.advance(BookingStep::DetailsAccepted { priced: false })?;
            let booking = self
                .persist(&mut flow, new_booking(user_id, &event, &buyer, total, None))
                .await?;
            info!(
                booking_id = %booking.id,
                %event_id,
                tickets = booking.tickets,
                "Free booking confirmed"
            );
            return Ok(CheckoutOutcome::Complete {
                booking: BookingReceipt::from(&booking),
            });
        }

        flow.advance(BookingStep::DetailsAccepted { priced: true })?;
        let payment = self
            .open_checkout(&mut flow, user_id, &event, buyer, total)
            .await?;
        Ok(CheckoutOutcome::AwaitingPayment { payment })
    }

    async fn open_checkout(
        &self,
        flow: &mut BookingFlow,
        user_id: Uuid,
        event: &Event,
        buyer: BuyerDetails,
        total: rust_decimal::Decimal,
    ) -> AppResult<PaymentCheckout> {
        let checkout_id = Uuid::new_v4();
        flow.attach_checkout(checkout_id);
        let receipt = format!("rcpt_{}", checkout_id.simple());
        let amount_minor =
            to_minor_units(total).map_err(|e| AppError::ValidationError(e.to_string()))?;

        let checkout = self
            .store
            .create_checkout(NewCheckout {
                id: checkout_id,
                user_id,
                event_id: event.id,
                tickets: buyer.tickets,
                total_amount: total,
                amount_minor,
                currency: self.currency.clone(),
                receipt: receipt.clone(),
                buyer_name: buyer.name,
                buyer_email: buyer.email,
                buyer_phone: buyer.phone,
            })
            .await?;

        let order = initiate_order(
            self.gateway.as_ref(),
            CreateOrderRequest {
                amount: total,
                currency: self.currency.clone(),
                receipt: receipt.clone(),
            },
        )
        .await;

        let order = match order {
            Ok(order) => order,
            Err(e) => {
                flow.fail("order creation failed");
                self.mark_failed(&checkout, &e.to_string()).await;
                return Err(e.into());
            }
        };

        let recorded = self
            .store
            .update_checkout(
                checkout.id,
                CheckoutState::AwaitingPayment,
                CheckoutUpdate {
                    order_id: Some(order.id.clone()),
                    ..CheckoutUpdate::default()
                },
            )
            .await;
        if let Err(e) = recorded {
            // Without the order id the checkout can never be confirmed or cancelled.
            error!(
                checkout_id = %checkout.id,
                order_id = %order.id,
                error = ?e,
                "Failed to record gateway order on checkout"
            );
            flow.fail("order id not recorded");
            self.mark_failed(&checkout, REASON_ORDER_NOT_RECORDED).await;
            return Err(e.into());
        }

        info!(
            checkout_id = %checkout.id,
            order_id = %order.id,
            amount = order.amount,
            "Awaiting payment"
        );

        Ok(PaymentCheckout {
            checkout_id: checkout.id,
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt,
            key_id: self.gateway.key_id().to_string(),
        })
    }

    /// Handles the checkout UI's success callback.
    pub async fn confirm_payment(
        &self,
        user_id: Uuid,
        callback: PaymentCallback,
    ) -> AppResult<BookingReceipt> {
        let checkout = self
            .store
            .checkout_by_order_id(&callback.razorpay_order_id)
            .await?;
        if checkout.user_id != user_id {
            return Err(AppError::Forbidden(
                "This checkout belongs to another user".to_string(),
            ));
        }

        let mut flow = BookingFlow::resume(checkout.event_id, checkout.id, checkout.state);
        match checkout.state {
            CheckoutState::Complete => return self.existing_receipt(&checkout).await,
            CheckoutState::Failed => {
                return Err(AppError::ValidationError(format!(
                    "Checkout has already failed: {}",
                    checkout.failure_reason.as_deref().unwrap_or("unknown reason")
                )))
            }
            CheckoutState::Persisting => {
                if checkout.payment_id.as_deref() != Some(callback.razorpay_payment_id.as_str()) {
                    return Err(AppError::Conflict(
                        "Checkout was paid with a different payment".to_string(),
                    ));
                }
            }
            CheckoutState::AwaitingPayment => {}
        }

        if !self.verifier.verify(&callback)? {
            warn!(
                checkout_id = %checkout.id,
                order_id = %callback.razorpay_order_id,
                "Payment signature mismatch"
            );
            if checkout.state == CheckoutState::AwaitingPayment {
                flow.fail(REASON_SIGNATURE_MISMATCH);
                self.mark_failed(&checkout, REASON_SIGNATURE_MISMATCH).await;
            }
            return Err(AppError::PaymentVerification(
                "Payment signature is invalid".to_string(),
            ));
        }

        let checkout = if checkout.state == CheckoutState::AwaitingPayment {
            flow.advance(BookingStep::PaymentVerified)?;
            self.store
                .update_checkout(
                    checkout.id,
                    CheckoutState::AwaitingPayment,
                    CheckoutUpdate {
                        state: Some(CheckoutState::Persisting),
                        payment_id: Some(callback.razorpay_payment_id.clone()),
                        ..CheckoutUpdate::default()
                    },
                )
                .await?
        } else {
            checkout
        };

        let booking = self.finish_checkout(&mut flow, &checkout).await?;
        Ok(BookingReceipt::from(&booking))
    }

    /// The buyer closed the checkout UI without paying.
    pub async fn cancel_checkout(&self, user_id: Uuid, order_id: &str) -> AppResult<Checkout> {
        let checkout = self.store.checkout_by_order_id(order_id).await?;
        if checkout.user_id != user_id {
            return Err(AppError::Forbidden(
                "This checkout belongs to another user".to_string(),
            ));
        }
        if checkout.state != CheckoutState::AwaitingPayment {
            return Ok(checkout);
        }

        let cancelled = self
            .store
            .update_checkout(
                checkout.id,
                CheckoutState::AwaitingPayment,
                CheckoutUpdate::failed(REASON_CANCELLED),
            )
            .await;
        match cancelled {
            Ok(checkout) => {
                let mut flow = BookingFlow::resume(checkout.event_id, checkout.id, checkout.state);
                flow.fail(REASON_CANCELLED);
                Ok(checkout)
            }
            // A confirmation moved the checkout on first; report where it is now.
            Err(StoreError::CheckoutStateChanged { actual, .. }) => {
                info!(
                    checkout_id = %checkout.id,
                    state = ?actual,
                    "Cancel lost to a concurrent update"
                );
                Ok(self.store.checkout_by_order_id(order_id).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Re-drives every checkout whose payment was verified but whose booking
    /// was never written, e.g. after a crash between the two steps.
    pub async fn reconcile_checkouts(&self, admin_id: Uuid) -> AppResult<ReconcileSummary> {
        let stuck = self
            .store
            .checkouts_in_state(CheckoutState::Persisting)
            .await?;
        let mut summary = ReconcileSummary {
            examined: stuck.len(),
            ..ReconcileSummary::default()
        };

        for checkout in stuck {
            let mut flow = BookingFlow::resume(checkout.event_id, checkout.id, checkout.state);
            let outcome = match self.finish_checkout(&mut flow, &checkout).await {
                Ok(booking) => {
                    summary.completed += 1;
                    json!({ "outcome": "completed", "booking_id": booking.id })
                }
                Err(AppError::Conflict(reason)) | Err(AppError::NotFound(reason)) => {
                    summary.failed += 1;
                    json!({ "outcome": "failed", "reason": reason })
                }
                Err(e) => {
                    error!(checkout_id = %checkout.id, error = ?e, "Reconciliation attempt failed");
                    continue;
                }
            };

            let logged = self
                .store
                .record_admin_action(NewAdminAction {
                    admin_id,
                    action_type: ACTION_CHECKOUT_RECONCILIATION,
                    target_type: "checkout",
                    target_id: checkout.id,
                    details: Some(outcome),
                })
                .await;
            if let Err(e) = logged {
                warn!(checkout_id = %checkout.id, error = ?e, "Failed to log reconciliation");
            }
        }

        info!(
            examined = summary.examined,
            completed = summary.completed,
            failed = summary.failed,
            "Checkout reconciliation finished"
        );
        Ok(summary)
    }

    async fn finish_checkout(&self, flow: &mut BookingFlow, checkout: &Checkout) -> AppResult<Booking> {
        let event = self.store.event_by_id(checkout.event_id).await?;
        let buyer = BuyerDetails {
            tickets: checkout.tickets,
            name: checkout.buyer_name.clone(),
            email: checkout.buyer_email.clone(),
            phone: checkout.buyer_phone.clone(),
        };
        let mut booking = new_booking(
            checkout.user_id,
            &event,
            &buyer,
            checkout.total_amount,
            checkout.payment_id.clone(),
        );
        booking.checkout_id = Some(checkout.id);

        match self.persist(flow, booking).await {
            Ok(booking) => {
                let completed = self
                    .store
                    .update_checkout(
                        checkout.id,
                        CheckoutState::Persisting,
                        CheckoutUpdate {
                            state: Some(CheckoutState::Complete),
                            booking_id: Some(booking.id),
                            ..CheckoutUpdate::default()
                        },
                    )
                    .await;
                match completed {
                    Ok(_) => {}
                    // A concurrent confirmation of the same payment completed it.
                    Err(StoreError::CheckoutStateChanged {
                        actual: CheckoutState::Complete,
                        ..
                    }) => {}
                    Err(e) => return Err(e.into()),
                }
                info!(
                    booking_id = %booking.id,
                    checkout_id = %checkout.id,
                    payment_id = ?checkout.payment_id,
                    "Paid booking confirmed"
                );
                Ok(booking)
            }
            Err(e @ AppError::Conflict(_)) | Err(e @ AppError::NotFound(_)) => {
                let reason = match &e {
                    AppError::Conflict(_) => REASON_CAPACITY_AFTER_PAYMENT,
                    _ => REASON_EVENT_GONE,
                };
                // The buyer has been charged; the refund is handled by hand.
                error!(
                    checkout_id = %checkout.id,
                    payment_id = ?checkout.payment_id,
                    reason,
                    "Paid checkout could not be booked, refund required"
                );
                self.mark_failed(checkout, reason).await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Writes the booking; the store enforces capacity atomically.
    async fn persist(&self, flow: &mut BookingFlow, booking: NewBooking) -> AppResult<Booking> {
        match self.store.persist_booking(booking).await {
            Ok(booking) => {
                flow.advance(BookingStep::Persisted)?;
                Ok(booking)
            }
            Err(e) => {
                if matches!(
                    e,
                    StoreError::CapacityExceeded { .. } | StoreError::NotFound { .. }
                ) {
                    flow.fail("booking rejected by store");
                }
                Err(e.into())
            }
        }
    }

    async fn existing_receipt(&self, checkout: &Checkout) -> AppResult<BookingReceipt> {
        let booking = self
            .store
            .booking_by_checkout(checkout.id)
            .await?
            .ok_or_else(|| {
                AppError::InternalServerError(format!(
                    "Checkout {} is complete but has no booking",
                    checkout.id
                ))
            })?;
        Ok(BookingReceipt::from(&booking))
    }

    /// Fails the checkout unless another request already moved it past the
    /// state this one read.
    async fn mark_failed(&self, checkout: &Checkout, reason: &str) {
        match self
            .store
            .update_checkout(checkout.id, checkout.state, CheckoutUpdate::failed(reason))
            .await
        {
            Ok(_) => {}
            Err(StoreError::CheckoutStateChanged { actual, .. }) => {
                info!(
                    checkout_id = %checkout.id,
                    state = ?actual,
                    reason,
                    "Checkout already moved on"
                );
            }
            Err(e) => {
                error!(checkout_id = %checkout.id, error = ?e, "Failed to mark checkout as failed");
            }
        }
    }
}

fn new_booking(
    user_id: Uuid,
    event: &Event,
    buyer: &BuyerDetails,
    total: rust_decimal::Decimal,
    payment_id: Option<String>,
) -> NewBooking {
    NewBooking {
        user_id,
        event_id: event.id,
        checkout_id: None,
        tickets: buyer.tickets,
        total_amount: total,
        booking_code: codes::booking_code(),
        qr_code: codes::qr_token(),
        buyer_name: buyer.name.clone(),
        buyer_email: buyer.email.clone(),
        buyer_phone: buyer.phone.clone(),
        payment_id,
    }
}
