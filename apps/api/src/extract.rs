//! Request extractors that answer malformed input with the error envelope.
//!
//! axum's own `Json` and `Query` reject with plain-text bodies; these wrap
//! them and turn the rejection into `ValidationFailed`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Json, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use stockroom_core::{CoreError, ValidationError};

use crate::error::ApiError;

/// JSON body extractor.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| malformed("body", rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// Query string extractor.
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| malformed("query", rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}

fn malformed(field: &str, reason: String) -> ApiError {
    CoreError::invalid_field(ValidationError::InvalidFormat {
        field: field.to_string(),
        reason,
    })
    .into()
}
