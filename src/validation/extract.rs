//! Axum extractors that run the validation gate.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde_json::{Map, Value};

use crate::domain::DomainError;
use crate::http::error::ApiError;
use crate::observability::logging::redact;
use crate::validation::gate::{accept, Validate};

/// JSON body that passed its rule set, in canonical form.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state).await?;
        tracing::debug!(body = %redact(&body), "Request body received");

        let Value::Object(input) = body else {
            return Err(DomainError::InvalidInput("Request body must be a JSON object".into()).into());
        };
        accept(input).map(ValidatedJson)
    }
}

/// Query string that passed its rule set, in canonical form.
///
/// Every parameter arrives as a string; numeric rules coerce it.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)?;
        let input: Map<String, Value> = pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        accept(input).map(ValidatedQuery)
    }
}
