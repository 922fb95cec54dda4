use std::sync::Arc;

use crate::services::admin::AdminService;
use crate::services::booking::BookingService;
use crate::services::events::EventService;
use crate::services::payments::{PaymentGateway, SignatureVerifier};
use crate::services::profiles::ProfileService;
use crate::services::reports::ReportService;
use crate::services::roles::RoleResolver;
use crate::services::tickets::TicketValidator;
use crate::store::Store;

/// Shared handles passed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub roles: RoleResolver,
    pub bookings: BookingService,
    pub events: EventService,
    pub tickets: TicketValidator,
    pub profiles: ProfileService,
    pub reports: ReportService,
    pub admin: AdminService,
    pub gateway: Arc<dyn PaymentGateway>,
    pub verifier: Arc<SignatureVerifier>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        verifier: SignatureVerifier,
        currency: impl Into<String>,
    ) -> Self {
        let verifier = Arc::new(verifier);
        Self {
            roles: RoleResolver::new(store.clone()),
            bookings: BookingService::new(
                store.clone(),
                gateway.clone(),
                verifier.clone(),
                currency,
            ),
            events: EventService::new(store.clone()),
            tickets: TicketValidator::new(store.clone()),
            profiles: ProfileService::new(store.clone()),
            reports: ReportService::new(store.clone()),
            admin: AdminService::new(store),
            gateway,
            verifier,
        }
    }
}
