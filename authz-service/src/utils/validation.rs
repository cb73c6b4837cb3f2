use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AuthError;

/// JSON extractor that runs `validator` rules and rejects with the
/// service's error envelope instead of axum's default.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AuthError::Validation(format!("Json parse error: {}", e)))?;

        value
            .validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        Ok(ValidatedJson(value))
    }
}
