//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation id
//! - `BearerToken`: the raw token from `Authorization: Bearer <token>`
//! - `CurrentUser`: the session resolved by the access gate
//! - `ValidJson`: a JSON body whose rejection is a structured 400
//! - `ValidPath`: path parameters whose rejection is a structured 400
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     State(state): State<AppState<S>>,
//!     CurrentUser(session): CurrentUser,
//!     ValidJson(request): ValidJson<CreateSale>,
//! ) -> Result<(StatusCode, Json<Sale>), AppError> {
//!     let sale = state.sales.create(&session.principal, request).await?;
//!     Ok((StatusCode::CREATED, Json(sale)))
//! }
//! ```

use crate::error::AppError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    Json,
};
use pharmacy_auth::ResolvedSession;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Taken from the request extensions when the correlation middleware ran,
/// otherwise from the `X-Correlation-ID` header, otherwise a new UUID v4.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Uuid>() {
            return Ok(Self(*id));
        }

        let correlation_id = parts
            .headers
            .get("X-Correlation-ID")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl BearerToken {
    /// Read the token from request headers, if one is present and well formed.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())?
            .strip_prefix("Bearer ")?
            .trim();

        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).ok_or_else(|| {
            AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
        })
    }
}

/// Authenticated caller.
///
/// The access gate resolves the session once per request and stores it in
/// the request extensions; this extractor only reads it back.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub ResolvedSession);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResolvedSession>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// JSON body extractor that reports every rejection as `400 BAD_REQUEST`.
///
/// Malformed JSON, unknown fields, missing fields and wrong types never
/// reach the services.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Request body rejected");
                Err(AppError::bad_request(rejection.body_text()))
            }
        }
    }
}

/// Path extractor that reports a malformed segment (e.g. a bad UUID) as
/// `400 BAD_REQUEST` with the usual error body.
#[derive(Debug, Clone, Copy)]
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Path rejected");
                Err(AppError::bad_request(rejection.body_text()))
            }
        }
    }
}
