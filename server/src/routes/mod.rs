use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, Config, SecurityHeaders};
use crate::handlers::{admin, bookings, events, health_check, me, payments, reports, tickets};
use crate::state::AppState;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me/role", get(me::my_role))
        .route(
            "/me/profile",
            get(me::my_profile).put(me::update_my_profile),
        )
        .route("/me/bookings", get(me::my_bookings))
        .route(
            "/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/checkout", post(bookings::begin_checkout))
        .route("/checkouts/confirm", post(bookings::confirm_payment))
        .route("/checkouts/:order_id/cancel", post(bookings::cancel_checkout))
        .route("/payments/orders", post(payments::create_order))
        .route("/payments/verify", post(payments::verify_payment))
        .route("/tickets/:qr", get(tickets::get_ticket))
        .route("/tickets/:qr/validate", post(tickets::validate_ticket))
        .route("/reports", post(reports::file_report))
        .nest("/admin", admin_routes())
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/:id/role", put(admin::assign_role))
        .route("/events", get(admin::list_events))
        .route("/events/:id/moderation", post(admin::moderate_event))
        .route("/reports", get(admin::list_reports))
        .route("/reports/:id/resolve", post(admin::resolve_report))
        .route("/actions", get(admin::list_actions))
        .route("/checkouts/reconcile", post(admin::reconcile_checkouts))
}

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes());

    SecurityHeaders::new(config.production)
        .apply(router)
        .layer(create_cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
