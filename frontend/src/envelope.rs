//! The single normalization step between the transport and every list view.
//!
//! Endpoints answer in one of three shapes:
//!
//! * `{ "status": "...", "data": { "<key>": [...], "results": 42 } }`
//! * `{ "data": [...] }`
//! * `[...]`
//!
//! All of them come out as a [`Listing`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::Listing;

pub fn normalize<T: DeserializeOwned>(key: &str, body: Value) -> ApiResult<Listing<T>> {
    match body {
        Value::Array(items) => Ok(Listing::new(decode_items(key, items)?, None)),
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => Ok(Listing::new(decode_items(key, items)?, None)),
            Some(Value::Object(mut data)) => {
                let results = data.get("results").and_then(Value::as_u64);
                let items = match data.remove(key) {
                    Some(Value::Array(items)) => decode_items(key, items)?,
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => {
                        return Err(ApiError::Malformed(format!(
                            "data.{key} is not a list: {other}"
                        )));
                    }
                };
                Ok(Listing::new(items, results))
            }
            Some(Value::Null) | None => Err(ApiError::Malformed(format!(
                "response for {key} carries no data"
            ))),
            Some(other) => Err(ApiError::Malformed(format!(
                "data for {key} has an unexpected shape: {other}"
            ))),
        },
        other => Err(ApiError::Malformed(format!(
            "response for {key} has an unexpected shape: {other}"
        ))),
    }
}

/// Unwraps `{ "data": X }` to `X`; anything else is returned as is.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut envelope) if envelope.contains_key("data") => {
            envelope.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn decode_items<T: DeserializeOwned>(key: &str, items: Vec<Value>) -> ApiResult<Vec<T>> {
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| ApiError::Malformed(format!("{key} entry: {e}")))
        })
        .collect()
}
