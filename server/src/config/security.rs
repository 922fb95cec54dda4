use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Response};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

const NOSNIFF: &str = "nosniff";
const DENY: &str = "DENY";
const XSS_BLOCK: &str = "1; mode=block";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";
const CSP_API_VALUE: &str = "default-src 'none'; frame-ancestors 'none'";
const REFERRER_POLICY_VALUE: &str = "strict-origin-when-cross-origin";
const PERMISSIONS_POLICY: &str = "permissions-policy";
const PERMISSIONS_POLICY_VALUE: &str = "geolocation=(), microphone=(), camera=()";

/// Hardening headers added to every API response.
#[derive(Debug, Clone, Copy)]
pub struct SecurityHeaders {
    include_hsts: bool,
}

impl SecurityHeaders {
    /// HSTS is only sent when served over HTTPS in production.
    pub fn new(include_hsts: bool) -> Self {
        if include_hsts {
            tracing::info!("Security: HSTS header enabled (production mode)");
        } else {
            tracing::info!("Security: HSTS header disabled (development mode)");
        }
        Self { include_hsts }
    }

    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let hsts = self
            .include_hsts
            .then(|| HeaderValue::from_static(HSTS_VALUE));

        router
            .layer(fixed(header::X_CONTENT_TYPE_OPTIONS, NOSNIFF))
            .layer(fixed(header::X_FRAME_OPTIONS, DENY))
            .layer(fixed(header::X_XSS_PROTECTION, XSS_BLOCK))
            .layer(fixed(header::CONTENT_SECURITY_POLICY, CSP_API_VALUE))
            .layer(fixed(header::REFERRER_POLICY, REFERRER_POLICY_VALUE))
            .layer(fixed(
                HeaderName::from_static(PERMISSIONS_POLICY),
                PERMISSIONS_POLICY_VALUE,
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::STRICT_TRANSPORT_SECURITY,
                move |_: &Response<Body>| hsts.clone(),
            ))
    }
}

fn fixed(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    async fn headers_for(include_hsts: bool) -> axum::http::HeaderMap {
        let router = SecurityHeaders::new(include_hsts)
            .apply(Router::new().route("/", get(|| async { "ok" })));
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.headers().clone()
    }

    #[tokio::test]
    async fn test_headers_without_hsts() {
        let headers = headers_for(false).await;
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], NOSNIFF);
        assert_eq!(headers[header::X_FRAME_OPTIONS], DENY);
        assert_eq!(headers[PERMISSIONS_POLICY], PERMISSIONS_POLICY_VALUE);
        assert!(headers.get(header::STRICT_TRANSPORT_SECURITY).is_none());
    }

    #[tokio::test]
    async fn test_headers_with_hsts() {
        let headers = headers_for(true).await;
        assert_eq!(headers[header::STRICT_TRANSPORT_SECURITY], HSTS_VALUE);
    }
}
