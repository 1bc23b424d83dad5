//! Caller identity extracted from the `X-User-Id` header.
//!
//! Authentication itself is out of scope; an upstream gateway is
//! expected to validate the caller and forward their id.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated user, extracted from `X-User-Id`.
///
/// Missing header rejects with 401, a malformed uuid with 400.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub UserId);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .ok_or_else(|| ApiError::Unauthorized("missing X-User-Id header".to_string()))?;

        let value = header
            .to_str()
            .map_err(|_| ApiError::BadRequest("X-User-Id is not valid UTF-8".to_string()))?;

        let uuid = Uuid::parse_str(value)
            .map_err(|e| ApiError::BadRequest(format!("Invalid X-User-Id: {e}")))?;

        Ok(Identity(UserId::from_uuid(uuid)))
    }
}
