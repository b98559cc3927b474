//! Envelope-preserving request extractors.
//!
//! axum's stock `Json` and `Query` extractors answer malformed input with
//! plain-text 400/415/422 bodies, which would be the only responses in the
//! whole API outside the `{ok, message}` envelope. These wrappers delegate
//! to the stock extractors and map their rejections into [`ApiError`], so a
//! bad payload (unparseable JSON, unknown enum value, missing parameter)
//! comes back as a 400 envelope like every other validation failure.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use caja_core::ValidationError;

use crate::error::ApiError;

/// `Json` with rejections mapped into the response envelope.
#[derive(Debug, Clone, Copy)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(reject_body(rejection)),
        }
    }
}

/// `Query` with rejections mapped into the response envelope.
#[derive(Debug, Clone, Copy)]
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(reject_query(rejection)),
        }
    }
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(ValidationError::InvalidFormat {
        field: "body".to_string(),
        reason: rejection.body_text(),
    })
}

fn reject_query(rejection: QueryRejection) -> ApiError {
    ApiError::Validation(ValidationError::InvalidFormat {
        field: "query".to_string(),
        reason: rejection.body_text(),
    })
}
