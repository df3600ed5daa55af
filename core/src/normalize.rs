//! Turn the service's in-band error envelope into `ApiError::Domain`.

use serde_json::Value;

use crate::error::ApiError;

/// Pass `value` through unless it is an object carrying an `error` key.
///
/// `{"error": false, ...}` is the success envelope used by the login and
/// publish endpoints and passes through untouched. Any other `error` value
/// yields `ApiError::Domain` with the object's `reason` (empty when absent).
pub fn normalize(value: Value) -> Result<Value, ApiError> {
    let Some(object) = value.as_object() else {
        return Ok(value);
    };
    match object.get("error") {
        None | Some(Value::Bool(false)) => Ok(value),
        Some(_) => {
            let reason = match object.get("reason") {
                Some(Value::String(reason)) => reason.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            Err(ApiError::Domain { reason })
        }
    }
}
