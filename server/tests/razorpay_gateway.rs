use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ticketing_server::config::GatewayConfig;
use ticketing_server::models::payment::CreateOrderRequest;
use ticketing_server::services::payments::{
    initiate_order, GatewayError, PaymentGateway, RazorpayGateway,
};

const KEY_ID: &str = "rzp_test_1234567890";
const KEY_SECRET: &str = "stub_secret";
// base64("rzp_test_1234567890:stub_secret")
const EXPECTED_AUTH: &str = "Basic cnpwX3Rlc3RfMTIzNDU2Nzg5MDpzdHViX3NlY3JldA==";

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn accept_order(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.requests.lock().push((auth, body.clone()));

    Json(json!({
        "id": "order_EKwxwAgItmmXdp",
        "entity": "order",
        "amount": body["amount"],
        "amount_paid": 0,
        "currency": body["currency"],
        "receipt": body["receipt"],
        "status": "created",
        "attempts": 0
    }))
}

async fn reject_order() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": {
                "code": "BAD_REQUEST_ERROR",
                "description": "Order amount less than minimum amount allowed"
            }
        })),
    )
}

async fn garbage() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "upstream down")
}

async fn spawn_stub() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/ok/orders", post(accept_order))
        .route("/bad/orders", post(reject_order))
        .route("/down/orders", post(garbage))
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

fn gateway(api_base: String) -> RazorpayGateway {
    RazorpayGateway::new(&GatewayConfig {
        key_id: KEY_ID.to_string(),
        key_secret: KEY_SECRET.to_string(),
        api_base,
        currency: "INR".to_string(),
    })
}

fn order(amount: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        amount: amount.parse().unwrap(),
        currency: "INR".to_string(),
        receipt: "rcpt_1".to_string(),
    }
}

#[tokio::test]
async fn order_is_created_in_minor_units_with_basic_auth() {
    let (base, seen) = spawn_stub().await;
    let gateway = gateway(format!("{base}/ok"));

    let created = initiate_order(&gateway, order("200.00")).await.unwrap();

    assert_eq!(created.id, "order_EKwxwAgItmmXdp");
    assert_eq!(created.amount, 20000);
    assert_eq!(created.extra["status"], "created");
    assert_eq!(gateway.key_id(), KEY_ID);

    let requests = seen.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0.as_deref(), Some(EXPECTED_AUTH));
    assert_eq!(
        requests[0].1,
        json!({ "amount": 20000, "currency": "INR", "receipt": "rcpt_1" })
    );
}

#[tokio::test]
async fn fractional_amounts_round_half_away_from_zero() {
    let (base, seen) = spawn_stub().await;
    let gateway = gateway(format!("{base}/ok"));

    initiate_order(&gateway, order("10.005")).await.unwrap();
    assert_eq!(seen.requests.lock()[0].1["amount"], 1001);
}

#[tokio::test]
async fn gateway_error_description_is_surfaced() {
    let (base, _) = spawn_stub().await;
    let gateway = gateway(format!("{base}/bad"));

    let err = initiate_order(&gateway, order("0.50")).await.unwrap_err();
    assert!(matches!(err, GatewayError::Rejected(_)));
    assert_eq!(
        err.to_string(),
        "Razorpay API error: Order amount less than minimum amount allowed"
    );
}

#[tokio::test]
async fn unparseable_error_body_falls_back_to_status() {
    let (base, _) = spawn_stub().await;
    let gateway = gateway(format!("{base}/down"));

    let err = initiate_order(&gateway, order("1.00")).await.unwrap_err();
    assert_eq!(err.to_string(), "Razorpay API error: Service Unavailable");
}

#[tokio::test]
async fn invalid_orders_never_reach_the_gateway() {
    let (base, seen) = spawn_stub().await;
    let gateway = gateway(format!("{base}/ok"));

    let err = initiate_order(&gateway, order("-5")).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidOrder(_)));

    let mut no_receipt = order("5");
    no_receipt.receipt = "  ".to_string();
    assert!(initiate_order(&gateway, no_receipt).await.is_err());

    assert!(seen.requests.lock().is_empty());
}
