use std::env;
use std::net::SocketAddr;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::SecurityHeaders;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_GATEWAY_API_BASE: &str = "https://api.razorpay.com/v1";
const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Payment gateway credentials and defaults.
#[derive(Clone)]
pub struct GatewayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub api_base: String,
    pub currency: String,
}

impl GatewayConfig {
    /// First eight characters of a credential, for logs.
    pub fn redact(value: &str) -> String {
        let prefix: String = value.chars().take(8).collect();
        format!("{prefix}...")
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("key_id", &Self::redact(&self.key_id))
            .field("key_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("currency", &self.currency)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub cors_allowed_origins: Option<String>,
    pub production: bool,
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_addr.clone(),
        })?;

        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value,
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            database_max_connections,
            bind_addr,
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS"),
            production: var("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
            gateway: GatewayConfig {
                key_id: required("RAZORPAY_KEY_ID")?,
                key_secret: required("RAZORPAY_KEY_SECRET")?,
                api_base: var("RAZORPAY_API_BASE")
                    .unwrap_or_else(|| DEFAULT_GATEWAY_API_BASE.to_string()),
                currency: var("DEFAULT_CURRENCY")
                    .map(|c| c.to_uppercase())
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("RAZORPAY_KEY_ID", "rzp_test_abcdefgh123"),
            ("RAZORPAY_KEY_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.database_url, None);
        assert_eq!(config.gateway.currency, "INR");
        assert_eq!(config.gateway.api_base, DEFAULT_GATEWAY_API_BASE);
        assert!(!config.production);
    }

    #[test]
    fn test_missing_gateway_secret_is_fatal() {
        let err = Config::from_lookup(lookup(&[("RAZORPAY_KEY_ID", "rzp_test_abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("RAZORPAY_KEY_SECRET")));

        let err = Config::from_lookup(lookup(&[
            ("RAZORPAY_KEY_ID", "  "),
            ("RAZORPAY_KEY_SECRET", "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("RAZORPAY_KEY_ID")));
    }

    #[test]
    fn test_invalid_bind_addr() {
        let err = Config::from_lookup(lookup(&[
            ("RAZORPAY_KEY_ID", "id"),
            ("RAZORPAY_KEY_SECRET", "secret"),
            ("BIND_ADDR", "not-an-addr"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "BIND_ADDR", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(lookup(&[
            ("RAZORPAY_KEY_ID", "rzp_test_abcdefgh123"),
            ("RAZORPAY_KEY_SECRET", "super-secret-value"),
        ]))
        .unwrap();

        let printed = format!("{:?}", config);
        assert!(printed.contains("rzp_test..."));
        assert!(!printed.contains("abcdefgh123"));
        assert!(!printed.contains("super-secret-value"));
    }
}
