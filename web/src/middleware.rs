//! Axum middleware for request tracking and access control.
//!
//! - **Correlation ID tracking**: extract or generate a correlation id, open
//!   an `http_request` span around the request, echo the id on the response
//! - **Access gate**: resolve the bearer session once and check it against
//!   the static route table before any handler runs
//!
//! # Flow
//!
//! 1. **Extract** correlation ID from `X-Correlation-ID` header (or generate new UUID)
//! 2. **Classify** the route with [`required_access`]
//! 3. **Resolve** the session (skipped for public routes) and store it in
//!    the request extensions
//! 4. **Reject** with 401 / 303 (no session) or 403 (wrong role)

use crate::error::AppError;
use crate::extractors::BearerToken;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header::ACCEPT, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use pharmacy_auth::{required_access, Access, ResolvedSession};
use pharmacy_core::repository::PharmacyStore;
use pharmacy_core::PharmacyError;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Where browsers without a session are sent.
pub const SIGN_IN_PAGE: &str = "/login";

/// Create a layer that adds correlation ID tracking to all requests.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        req.extensions_mut().insert(correlation_id);

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            uri = %req.uri(),
        );

        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.instrument(span).await?;

            if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
                response
                    .headers_mut()
                    .insert(CORRELATION_ID_HEADER, header_value);
            }

            Ok(response)
        })
    }
}

/// Route gate. Install with `axum::middleware::from_fn_with_state`.
///
/// On success the resolved session is inserted into the request extensions
/// for [`CurrentUser`](crate::extractors::CurrentUser).
pub async fn access_gate<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    mut request: Request,
    next: Next,
) -> Response {
    let access = required_access(request.method(), request.uri().path());
    if access == Access::Public {
        return next.run(request).await;
    }

    let token = BearerToken::from_headers(request.headers());
    let session = match resolve(&state, token).await {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };

    if !access.permits(session.as_ref().map(|s| &s.principal)) {
        return match session {
            None => unauthenticated(&request),
            Some(session) => {
                tracing::info!(
                    user_id = %session.principal.user_id,
                    role = %session.principal.role,
                    path = %request.uri().path(),
                    "Access denied"
                );
                AppError::forbidden("This action requires the ADMIN role").into_response()
            }
        };
    }

    if let Some(session) = session {
        request.extensions_mut().insert(session);
    }
    next.run(request).await
}

async fn resolve<S: PharmacyStore>(
    state: &AppState<S>,
    token: Option<BearerToken>,
) -> Result<Option<ResolvedSession>, AppError> {
    let Some(BearerToken(token)) = token else {
        return Ok(None);
    };

    match state.auth.resolve_session(&token).await {
        Ok(session) => Ok(Some(session)),
        Err(PharmacyError::Unauthorized) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// 303 to the sign-in page for browsers, 401 JSON for everyone else.
fn unauthenticated(request: &Request) -> Response {
    let wants_html = request
        .headers()
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));

    if wants_html {
        let callback = urlencoding::encode(request.uri().path());
        Redirect::to(&format!("{SIGN_IN_PAGE}?callbackUrl={callback}")).into_response()
    } else {
        AppError::from(PharmacyError::Unauthorized).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_correlation_id_generated_if_missing() {
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(correlation_id_layer());

        let request = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        let correlation_id = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("Correlation ID header should be present");

        let uuid_str = correlation_id.to_str().unwrap();
        assert!(Uuid::parse_str(uuid_str).is_ok());
    }

    #[tokio::test]
    async fn test_correlation_id_preserved_from_request() {
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(correlation_id_layer());

        let request_uuid = Uuid::new_v4();
        let request = Request::builder()
            .uri("/test")
            .header(CORRELATION_ID_HEADER, request_uuid.to_string())
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        let response_id = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("Correlation ID header should be present")
            .to_str()
            .unwrap();

        assert_eq!(response_id, request_uuid.to_string());
    }

    #[tokio::test]
    async fn test_invalid_uuid_generates_new() {
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(correlation_id_layer());

        let request = Request::builder()
            .uri("/test")
            .header(CORRELATION_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        let correlation_id = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("Correlation ID header should be present");

        let uuid_str = correlation_id.to_str().unwrap();
        assert!(Uuid::parse_str(uuid_str).is_ok());
        assert_ne!(uuid_str, "not-a-uuid");
    }

    #[test]
    fn test_unauthenticated_browser_is_redirected() {
        let request = Request::builder()
            .uri("/api/sales")
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .body(Body::empty())
            .unwrap();

        let response = unauthenticated(&request);
        assert_eq!(response.status(), 303);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/login?callbackUrl=%2Fapi%2Fsales"
        );
    }

    #[test]
    fn test_unauthenticated_api_client_gets_401() {
        let request = Request::builder()
            .uri("/api/sales")
            .header(ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap();

        assert_eq!(unauthenticated(&request).status(), 401);
    }
}
