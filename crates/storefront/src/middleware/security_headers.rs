//! Security headers middleware.
//!
//! The storefront only serves JSON (plus the bank redirect landing), so the
//! policy is as tight as it gets: nothing may be loaded, framed or cached.

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// CSP for JSON responses.
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'; base-uri 'none'; form-action 'none'";

/// One year, applied only when served over HTTPS.
const HSTS: &str = "max-age=31536000; includeSubDomains";

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: no-referrer`
/// - `Content-Security-Policy` (see [`API_CSP`])
/// - `Cache-Control: no-store` (responses carry per-visitor state)
/// - `Cross-Origin-Opener-Policy` and `Cross-Origin-Resource-Policy: same-origin`
/// - `Strict-Transport-Security` when the request arrived over HTTPS
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let secure = is_https(request.headers(), request.uri().scheme_str());
    let mut response = next.run(request).await;
    apply(response.headers_mut(), secure);
    response
}

/// Whether the client connection was HTTPS, trusting the proxy's
/// `X-Forwarded-Proto` when present.
fn is_https(headers: &HeaderMap, scheme: Option<&str>) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .or(scheme)
        .is_some_and(|s| s.eq_ignore_ascii_case("https"))
}

fn apply(headers: &mut HeaderMap, secure: bool) {
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(API_CSP));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    if secure {
        headers.insert(STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware, routing::get};
    use tower::ServiceExt;

    async fn get_headers(forwarded_proto: Option<&str>) -> HeaderMap {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(security_headers_middleware));

        let mut request = Request::builder().uri("/");
        if let Some(proto) = forwarded_proto {
            request = request.header("x-forwarded-proto", proto);
        }

        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .headers()
            .clone()
    }

    #[tokio::test]
    async fn test_headers_present() {
        let headers = get_headers(None).await;
        assert_eq!(headers.get(X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(headers.get(CONTENT_SECURITY_POLICY).unwrap(), API_CSP);
        assert!(headers.get(STRICT_TRANSPORT_SECURITY).is_none());
    }

    #[tokio::test]
    async fn test_hsts_behind_https_proxy() {
        let headers = get_headers(Some("https")).await;
        assert_eq!(headers.get(STRICT_TRANSPORT_SECURITY).unwrap(), HSTS);
    }
}
