//! Request extractors with rejections mapped onto [`ApiError`]

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::error::ApiError;
use crate::domain::OwnerId;

/// Header carrying the verified caller identity, set by the auth layer in front of this service
pub const OWNER_HEADER: &str = "x-user-id";

/// The authenticated owner of the request
#[derive(Debug, Clone)]
pub struct CurrentOwner(pub OwnerId);

impl<S> FromRequestParts<S> for CurrentOwner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(owner) = parts.extensions.get::<CurrentOwner>() {
            return Ok(owner.clone());
        }

        let header = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|h| h.to_str().ok());

        let owner = match header.map(OwnerId::new) {
            Some(Ok(owner)) => owner,
            _ => {
                warn!(uri = %parts.uri, "request without caller identity");
                return Err(ApiError::Unauthorized);
            }
        };

        let current = CurrentOwner(owner);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// JSON body whose parse failures surface as validation errors
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string whose parse failures surface as validation errors
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        Ok(Self(value))
    }
}
