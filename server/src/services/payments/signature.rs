use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::models::payment::PaymentCallback;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Razorpay key secret not found")]
    MissingSecret,
    #[error("{0} is missing")]
    MalformedInput(&'static str),
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// Checks payment callbacks against the gateway's shared secret.
///
/// The signature of a callback is the lowercase hex
/// `HMAC-SHA256(secret, order_id + "|" + payment_id)`.
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, SignatureError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SignatureError::MissingSecret);
        }
        Ok(Self { secret })
    }

    pub fn sign(&self, order_id: &str, payment_id: &str) -> Result<String, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// `Ok(false)` on mismatch; errors are reserved for unusable input.
    pub fn verify(&self, callback: &PaymentCallback) -> Result<bool, SignatureError> {
        if callback.razorpay_order_id.is_empty() {
            return Err(SignatureError::MalformedInput("razorpay_order_id"));
        }
        if callback.razorpay_payment_id.is_empty() {
            return Err(SignatureError::MalformedInput("razorpay_payment_id"));
        }
        if callback.razorpay_signature.is_empty() {
            return Err(SignatureError::MalformedInput("razorpay_signature"));
        }

        let expected = self.sign(&callback.razorpay_order_id, &callback.razorpay_payment_id)?;
        let supplied = callback.razorpay_signature.as_bytes();
        if expected.len() != supplied.len() {
            return Ok(false);
        }
        Ok(expected.as_bytes().ct_eq(supplied).into())
    }
}
