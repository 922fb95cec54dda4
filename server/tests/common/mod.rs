#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, NaiveTime};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tower::ServiceExt;
use uuid::Uuid;

use ticketing_server::config::Config;
use ticketing_server::models::event::{Event, NewEvent};
use ticketing_server::models::payment::{GatewayOrder, NewOrder};
use ticketing_server::models::role::Role;
use ticketing_server::routes::create_routes;
use ticketing_server::services::payments::{GatewayError, PaymentGateway, SignatureVerifier};
use ticketing_server::state::AppState;
use ticketing_server::store::{MemoryStore, Store};

pub const KEY_ID: &str = "rzp_test_1234567890";
pub const KEY_SECRET: &str = "test_secret_key";

/// Gateway double that records every order it is asked to create.
#[derive(Default)]
pub struct FakeGateway {
    pub orders: Mutex<Vec<NewOrder>>,
    pub reject: Mutex<Option<String>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn key_id(&self) -> &str {
        KEY_ID
    }

    async fn create_order(&self, order: NewOrder) -> Result<GatewayOrder, GatewayError> {
        if let Some(message) = self.reject.lock().clone() {
            return Err(GatewayError::Rejected(message));
        }
        let mut orders = self.orders.lock();
        orders.push(order.clone());
        Ok(GatewayOrder {
            id: format!("order_{}", orders.len()),
            amount: order.amount,
            currency: order.currency,
            extra: Map::new(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(FakeGateway::default());
        let verifier = SignatureVerifier::new(KEY_SECRET).unwrap();
        let state = AppState::new(store.clone(), gateway.clone(), verifier, "INR");

        let config = Config::from_lookup(|name| match name {
            "RAZORPAY_KEY_ID" => Some(KEY_ID.to_string()),
            "RAZORPAY_KEY_SECRET" => Some(KEY_SECRET.to_string()),
            _ => None,
        })
        .unwrap();

        Self {
            router: create_routes(state, &config),
            store,
            gateway,
        }
    }

    pub async fn event(&self, price: Decimal, max_attendees: Option<i32>) -> Event {
        self.store
            .create_event(NewEvent {
                title: "Rust Meetup".to_string(),
                description: None,
                date: NaiveDate::from_ymd_opt(2030, 5, 17).unwrap(),
                time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
                venue: "Hall A".to_string(),
                price,
                max_attendees,
                category: None,
                image: None,
                organizer_id: Uuid::new_v4(),
            })
            .await
            .unwrap()
    }

    pub async fn user_with_role(&self, role: Role) -> Uuid {
        let user_id = Uuid::new_v4();
        self.store
            .assign_role(user_id, role, Uuid::new_v4())
            .await
            .unwrap();
        user_id
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(&self.router, method, uri, user, body).await
    }
}

pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    user: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub fn buyer(tickets: i32) -> Value {
    serde_json::json!({
        "tickets": tickets,
        "buyer_name": "Ada Lovelace",
        "buyer_email": "ada@example.com",
        "buyer_phone": "+91 98765 43210"
    })
}

pub fn signed_callback(order_id: &str, payment_id: &str) -> Value {
    let signature = SignatureVerifier::new(KEY_SECRET)
        .unwrap()
        .sign(order_id, payment_id)
        .unwrap();
    serde_json::json!({
        "razorpay_order_id": order_id,
        "razorpay_payment_id": payment_id,
        "razorpay_signature": signature
    })
}
