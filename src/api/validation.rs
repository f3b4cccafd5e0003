//! JSON body extractor that runs `validator` rules before the handler sees the body

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::{ApiError, FieldError};

/// Like [`axum::Json`], but rejects with [`ApiError::Validation`] when the body cannot be
/// decoded or fails its declared rules.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(vec![FieldError::body(rejection.body_text())]))?;

        value.validate()?;
        Ok(Self(value))
    }
}
