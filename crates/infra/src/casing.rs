//! Key-casing conversion between the wire format (`snake_case`) and the
//! object model (`camelCase`).
//!
//! Both directions walk a [`serde_json::Value`] recursively: object keys are
//! rewritten, arrays are mapped element-wise, scalars pass through untouched.
//! A key that is a single emoji (reaction indexes use these) is never
//! converted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static SINGLE_EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[0-9#*]\x{FE0F}?\x{20E3}|[\x{1F1E6}-\x{1F1FF}]{2}|\p{Extended_Pictographic}[\x{1F3FB}-\x{1F3FF}\x{FE0F}]*(?:\x{200D}\p{Extended_Pictographic}[\x{1F3FB}-\x{1F3FF}\x{FE0F}]*)*)$",
    )
    .expect("SINGLE_EMOJI should compile - this is a bug")
});

/// Convert every key in `value` to wire format (`snake_case`).
pub fn to_wire_format(value: Value) -> Value {
    transform_keys(value, &camel_to_snake)
}

/// Convert every key in `value` to object format (`camelCase`).
pub fn to_object_format(value: Value) -> Value {
    transform_keys(value, &snake_to_camel)
}

fn transform_keys(value: Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let converted: Map<String, Value> = map
                .into_iter()
                .map(|(key, nested)| {
                    let key = if is_single_emoji(&key) { key } else { convert(&key) };
                    (key, transform_keys(nested, convert))
                })
                .collect();
            Value::Object(converted)
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| transform_keys(item, convert)).collect())
        }
        scalar => scalar,
    }
}

pub(crate) fn is_single_emoji(key: &str) -> bool {
    SINGLE_EMOJI.is_match(key)
}

/// `projectId` -> `project_id`, `HTMLBody` -> `html_body`.
pub(crate) fn camel_to_snake(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) => p.is_uppercase() && next.is_some_and(char::is_lowercase),
            };
            if boundary {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

/// `project_id` -> `projectId`. Leading underscores are preserved.
pub(crate) fn snake_to_camel(key: &str) -> String {
    let trimmed = key.trim_start_matches('_');
    let mut out = String::with_capacity(key.len());
    out.push_str(&key[..key.len() - trimmed.len()]);

    let mut upper_next = false;
    for ch in trimmed.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }

    out
}
