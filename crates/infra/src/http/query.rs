//! Query-string encoding for GET payloads.
//!
//! Arrays become a single comma-joined value, `null` parameters are dropped,
//! everything else is stringified.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Encode `params` as `application/x-www-form-urlencoded`.
///
/// Parameters keep the payload's key order. Returns `None` when no parameter
/// survives (so no `?` is appended).
pub fn encode_query(params: &Map<String, Value>) -> Option<String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;

    for (key, value) in params {
        if let Some(encoded) = stringify(value) {
            serializer.append_pair(key, &encoded);
            any = true;
        }
    }

    any.then(|| serializer.finish())
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            Some(items.iter().filter_map(stringify).collect::<Vec<_>>().join(","))
        }
        Value::Object(_) => Some(value.to_string()),
    }
}
