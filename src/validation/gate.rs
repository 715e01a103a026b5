//! The validation gate.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::http::error::ApiError;
use crate::validation::rules::{RuleSet, ValidationError, BODY_FIELD};

/// Input type with a static rule set.
pub trait Validate: DeserializeOwned {
    fn rules() -> &'static RuleSet;
}

/// Turn collected field errors into a rejection.
pub fn gate(errors: Vec<ValidationError>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// Validate `input` and run `handler` on its canonical form.
///
/// `handler` is not called when any rule fails.
pub fn guard<T, F>(rules: &RuleSet, mut input: Map<String, Value>, handler: F) -> Result<T, ApiError>
where
    F: FnOnce(Map<String, Value>) -> Result<T, ApiError>,
{
    gate(rules.validate(&mut input))?;
    handler(input)
}

/// Validate `input` against `T`'s rules and deserialize the canonical form.
///
/// A canonical value that still does not fit `T` (a number beyond the
/// target integer's range, say) is the client's fault and is rejected as a
/// validation failure.
pub fn accept<T: Validate>(input: Map<String, Value>) -> Result<T, ApiError> {
    guard(T::rules(), input, |canonical| {
        serde_json::from_value(Value::Object(canonical)).map_err(|err| {
            ApiError::Validation(vec![ValidationError::new(
                BODY_FIELD,
                format!("Invalid input: {err}"),
                Value::Null,
            )])
        })
    })
}
