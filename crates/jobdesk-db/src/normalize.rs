//! Dynamic payload normalization.
//!
//! Inbound submissions carry an arbitrary key/value JSON object. This
//! module flattens that object into typed gateway parameters, inferring a
//! storage type per value. Pure transform; no side effects.

use serde_json::{Map, Value};

use jobdesk_core::constants::LIST_VALUED_KEYS;

use crate::params::ParamValue;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("unsupported value for key '{key}'")]
    UnsupportedValueKind { key: String },
}

/// Convert one payload value into a typed parameter:
/// string → sized text, integral number → int, non-integral → float,
/// bool → bool, array/object → raw serialized text, null → null.
fn infer_param(key: &str, value: &Value) -> Result<ParamValue, NormalizeError> {
    match value {
        Value::String(s) => Ok(ParamValue::text(s.clone())),
        Value::Number(n) => {
            if let Some(v) = n.as_i64().and_then(|v| i32::try_from(v).ok()) {
                Ok(ParamValue::Int(v))
            } else if let Some(v) = n.as_f64() {
                Ok(ParamValue::Float(v))
            } else {
                Err(NormalizeError::UnsupportedValueKind {
                    key: key.to_string(),
                })
            }
        }
        Value::Bool(b) => Ok(ParamValue::Bool(*b)),
        Value::Array(_) | Value::Object(_) => Ok(ParamValue::raw(value.to_string())),
        Value::Null => Ok(ParamValue::Null),
    }
}

/// Flatten the payload map into gateway parameters, preserving key order.
pub fn normalize_payload(
    payload: &Map<String, Value>,
) -> Result<Vec<(String, ParamValue)>, NormalizeError> {
    let mut params = Vec::with_capacity(payload.len());
    for (key, value) in payload {
        params.push((key.clone(), infer_param(key, value)?));
    }
    Ok(params)
}

/// Parameters for the designated list-valued keys. Present-and-array values
/// pass through as raw array text; anything else defaults to an empty-array
/// literal so clients may omit optional repeating sections.
pub fn list_params(payload: &Map<String, Value>) -> Vec<(String, ParamValue)> {
    LIST_VALUED_KEYS
        .iter()
        .map(|key| {
            let value = match payload.get(*key) {
                Some(v @ Value::Array(_)) => ParamValue::raw(v.to_string()),
                _ => ParamValue::raw("[]"),
            };
            ((*key).to_string(), value)
        })
        .collect()
}
