mod common;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use common::{buyer, signed_callback, TestApp};
use ticketing_server::models::role::Role;

async fn free_ticket(app: &TestApp) -> String {
    let event = app.event(Decimal::ZERO, None).await;
    let (_, body) = app
        .send(
            "POST",
            &format!("/api/events/{}/checkout", event.id),
            Some(Uuid::new_v4()),
            Some(buyer(1)),
        )
        .await;
    body["data"]["booking"]["qr_code"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn ticket_is_validated_exactly_once() {
    let app = TestApp::new();
    let qr = free_ticket(&app).await;
    let organizer = app.user_with_role(Role::Organizer).await;
    let uri = format!("/api/tickets/{qr}/validate");

    let (status, first) = app.send("POST", &uri, Some(organizer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["outcome"], "validated");
    let validated_at = first["data"]["ticket"]["validated_at"].clone();
    assert!(!validated_at.is_null());

    let other = app.user_with_role(Role::Admin).await;
    let (status, second) = app.send("POST", &uri, Some(other), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["outcome"], "already_validated");
    assert_eq!(second["data"]["ticket"]["validated_at"], validated_at);
    assert_eq!(
        second["data"]["ticket"]["validated_by"],
        json!(organizer.to_string())
    );
}

#[tokio::test]
async fn unknown_ticket_is_a_normal_result() {
    let app = TestApp::new();
    let organizer = app.user_with_role(Role::Organizer).await;

    let (status, body) = app
        .send("GET", "/api/tickets/does-not-exist", Some(organizer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "outcome": "not_found" }));

    let (status, body) = app
        .send("POST", "/api/tickets/does-not-exist/validate", Some(organizer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "not_found");
}

#[tokio::test]
async fn lookup_shows_event_details_without_validating() {
    let app = TestApp::new();
    let qr = free_ticket(&app).await;
    let organizer = app.user_with_role(Role::Organizer).await;

    let (_, body) = app
        .send("GET", &format!("/api/tickets/{qr}"), Some(organizer), None)
        .await;
    assert_eq!(body["data"]["outcome"], "found");
    assert_eq!(body["data"]["ticket"]["event_title"], "Rust Meetup");
    assert!(body["data"]["ticket"]["validated_at"].is_null());
}

#[tokio::test]
async fn plain_users_cannot_scan_tickets() {
    let app = TestApp::new();
    let qr = free_ticket(&app).await;

    let (status, _) = app
        .send("POST", &format!("/api/tickets/{qr}/validate"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/tickets/{qr}/validate"),
            Some(Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn anonymous_role_is_null() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api/me/role", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({ "role": null, "can_manage_events": false, "is_admin": false })
    );
}

#[tokio::test]
async fn new_user_gets_a_default_role_row() {
    let app = TestApp::new();
    let user = Uuid::new_v4();

    let (_, body) = app.send("GET", "/api/me/role", Some(user), None).await;
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(app.store.role_rows(user).len(), 1);

    app.send("GET", "/api/me/role", Some(user), None).await;
    assert_eq!(app.store.role_rows(user).len(), 1);
}

#[tokio::test]
async fn malformed_identity_header_is_unauthorized() {
    let app = TestApp::new();
    let response = {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let request = Request::get("/api/me/bookings")
            .header("x-user-id", "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        app.router.clone().oneshot(request).await.unwrap()
    };
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_role_change_is_reflected_and_audited() {
    let app = TestApp::new();
    let admin = app.user_with_role(Role::Admin).await;
    let user = Uuid::new_v4();

    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/admin/users/{user}/role"),
            Some(admin),
            Some(json!({ "role": "organizer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send("GET", "/api/me/role", Some(user), None).await;
    assert_eq!(
        body["data"],
        json!({ "role": "organizer", "can_manage_events": true, "is_admin": false })
    );

    let (_, body) = app
        .send("GET", "/api/admin/actions?limit=10", Some(admin), None)
        .await;
    assert_eq!(body["data"][0]["action_type"], "role_change");
    assert_eq!(body["data"][0]["details"], json!({ "role": "organizer" }));
}

#[tokio::test]
async fn my_bookings_lists_event_details() {
    let app = TestApp::new();
    let event = app.event(Decimal::new(25000, 2), None).await;
    let user = Uuid::new_v4();

    let (_, body) = app
        .send(
            "POST",
            &format!("/api/events/{}/checkout", event.id),
            Some(user),
            Some(buyer(1)),
        )
        .await;
    let order_id = body["data"]["payment"]["order_id"].as_str().unwrap().to_string();
    app.send(
        "POST",
        "/api/checkouts/confirm",
        Some(user),
        Some(signed_callback(&order_id, "pay_1")),
    )
    .await;

    let (status, body) = app.send("GET", "/api/me/bookings", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = body["data"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["event_venue"], "Hall A");
    assert_eq!(bookings[0]["total_amount"], "250.00");
}
