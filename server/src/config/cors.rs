use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::USER_ID_HEADER;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

/// CORS for the browser front end. `origins` is a comma separated list, the
/// local dev servers are allowed when it is absent.
pub fn create_cors_layer(origins: Option<&str>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(parse_origins(origins.unwrap_or(DEFAULT_ALLOWED_ORIGINS)))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([header::CONTENT_LENGTH, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(PREFLIGHT_MAX_AGE_SECS))
}

fn parse_origins(origins_str: &str) -> AllowOrigin {
    let origins: Vec<HeaderValue> = origins_str
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::debug!("CORS: Allowing origin: {}", origin);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        // Credentialed CORS cannot use a wildcard, so fall back to the dev servers.
        tracing::warn!("CORS: No valid origins configured, falling back to local dev origins");
        return parse_origins(DEFAULT_ALLOWED_ORIGINS);
    }

    tracing::info!("CORS: Configured with {} allowed origin(s)", origins.len());
    AllowOrigin::list(origins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_cors_layer() {
        let _default = create_cors_layer(None);
        let _custom = create_cors_layer(Some("https://tickets.example.com, ,bad\u{7f}origin"));
    }

    #[test]
    fn test_default_origins_are_valid() {
        for origin in DEFAULT_ALLOWED_ORIGINS.split(',') {
            let trimmed = origin.trim();
            assert!(
                trimmed.parse::<HeaderValue>().is_ok(),
                "Default origin '{}' should be a valid HeaderValue",
                trimmed
            );
        }
    }
}
