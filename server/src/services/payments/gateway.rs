use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::GatewayConfig;
use crate::models::payment::{CreateOrderRequest, GatewayOrder, NewOrder};
use crate::utils::money::to_minor_units;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),
    /// The gateway answered with a non-2xx status.
    #[error("{0}")]
    Rejected(String),
    #[error("payment gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected payment gateway response: {0}")]
    InvalidResponse(String),
}

/// Creates orders on the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id the checkout UI needs to open the payment form.
    fn key_id(&self) -> &str;

    /// Creates one order. Never retried: a retry could create a second order.
    async fn create_order(&self, order: NewOrder) -> Result<GatewayOrder, GatewayError>;
}

/// Validates an order request and converts it to minor units before handing
/// it to the gateway.
pub async fn initiate_order(
    gateway: &dyn PaymentGateway,
    request: CreateOrderRequest,
) -> Result<GatewayOrder, GatewayError> {
    let currency = request.currency.trim().to_uppercase();
    if currency.is_empty() {
        return Err(GatewayError::InvalidOrder("currency is required".to_string()));
    }
    let receipt = request.receipt.trim().to_string();
    if receipt.is_empty() {
        return Err(GatewayError::InvalidOrder("receipt is required".to_string()));
    }
    let amount =
        to_minor_units(request.amount).map_err(|e| GatewayError::InvalidOrder(e.to_string()))?;

    gateway
        .create_order(NewOrder {
            amount,
            currency,
            receipt,
        })
        .await
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    description: Option<String>,
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.description.or(e.error.code));

    match detail {
        Some(detail) => format!("Razorpay API error: {detail}"),
        None => format!(
            "Razorpay API error: {}",
            status.canonical_reason().unwrap_or(status.as_str())
        ),
    }
}

/// Razorpay orders API client, authenticated with HTTP basic auth.
pub struct RazorpayGateway {
    client: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_order(&self, order: NewOrder) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/orders", self.api_base);
        info!(
            key_id = %GatewayConfig::redact(&self.key_id),
            amount = order.amount,
            currency = %order.currency,
            receipt = %order.receipt,
            "Creating payment order"
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&order)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), body = %body, "Payment gateway responded");

        if !status.is_success() {
            let message = describe_failure(status, &body);
            error!(status = status.as_u16(), message = %message, "Order creation rejected");
            return Err(GatewayError::Rejected(message));
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}
