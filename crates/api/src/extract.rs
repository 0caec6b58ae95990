//! Request extractors.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use common::{USER_NAME_HEADER, Username};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// The authenticated user, taken from the `X-User-Name` header set by the
/// upstream authenticator.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Username);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_NAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| CurrentUser(Username::from(name)))
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_NAME_HEADER} header")))
    }
}

/// A JSON request body. Unlike [`Json`], a body that does not parse is
/// answered with the usual `{"message": ...}` error shape.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}
