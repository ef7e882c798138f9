//! Tolerant extraction of values from protect/reveal response bodies.
//!
//! Deployed servers disagree on response shapes: some return flat
//! objects, some Thales-style `*_array` lists of objects, some `results`
//! wrappers, some plain lists. These helpers accept every spelling seen
//! in the field and extract nothing (rather than failing) from error or
//! non-JSON bodies.
use serde_json::Value;

use crate::client::ApiResponse;

fn plain_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pull the protected token out of a single protect response. Missing,
/// null, and empty-string values fall through to the next candidate key.
pub fn extract_protected(resp: &ApiResponse) -> Option<String> {
    let body = resp.body_json()?.as_object()?;
    for key in ["protected_data", "protected", "token"] {
        match body.get(key) {
            Some(Value::Null) | None => continue,
            Some(v) => {
                let s = plain_string(v);
                if !s.is_empty() {
                    return Some(s);
                }
            }
        }
    }
    None
}

/// Pull the restored cleartext out of a single reveal response. The
/// first candidate key present wins, even when its value is null.
pub fn extract_restored(resp: &ApiResponse) -> Option<String> {
    let body = resp.body_json()?.as_object()?;
    for key in [
        "data",
        "original",
        "plain",
        "revealed",
        "unprotected_data",
        "unprotected",
        "decrypted",
    ] {
        if let Some(v) = body.get(key) {
            return match v {
                Value::Null => None,
                other => Some(plain_string(other)),
            };
        }
    }
    None
}

fn strings_from_keyed_objects(list: &[Value], keys: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for item in list {
        if let Some(obj) = item.as_object() {
            for key in keys {
                if let Some(v) = obj.get(*key) {
                    out.push(plain_string(v));
                    break;
                }
            }
        }
    }
    out
}

/// Extract the token list from a bulk protect response.
pub fn extract_protected_list(resp: &ApiResponse) -> Vec<String> {
    let Some(body) = resp.body_json() else {
        return Vec::new();
    };
    match body {
        Value::Array(items) => items.iter().map(plain_string).collect(),
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("protected_data") {
                return items.iter().map(plain_string).collect();
            }
            if let Some(Value::Array(items)) = map.get("protected_data_array") {
                return strings_from_keyed_objects(items, &["protected_data"]);
            }
            if let Some(Value::Array(items)) = map.get("results") {
                return strings_from_keyed_objects(items, &["protected_data"]);
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Extract the restored-value list from a bulk reveal response. Falls
/// back to scalar object values when no known list key is present.
pub fn extract_restored_list(resp: &ApiResponse) -> Vec<String> {
    let Some(body) = resp.body_json() else {
        return Vec::new();
    };
    match body {
        Value::Array(items) => items.iter().map(plain_string).collect(),
        Value::Object(map) => {
            for key in ["data", "restored", "items"] {
                if let Some(Value::Array(items)) = map.get(key) {
                    return items.iter().map(plain_string).collect();
                }
            }
            if let Some(Value::Array(items)) = map.get("results") {
                return strings_from_keyed_objects(items, &["data", "restored", "value"]);
            }
            if let Some(Value::Array(items)) = map.get("data_array") {
                return strings_from_keyed_objects(items, &["data"]);
            }
            map.values()
                .filter(|v| v.is_string() || v.is_number())
                .map(plain_string)
                .collect()
        }
        _ => Vec::new(),
    }
}
