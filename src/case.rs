//! Case conversion between local naming (snake_case fields, CamelCase type names) and wire naming (camelCase keys).

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static CAMEL_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_](\w)").expect("static regex"));
static WORD_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w").expect("static regex"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Convert a single identifier from snake_case or kebab-case to camelCase.
/// e.g. "user_id" -> "userId", "created-at" -> "createdAt"
pub fn to_camel_case(s: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(s, |caps: &regex::Captures<'_>| caps[1].to_uppercase())
        .into_owned()
}

/// Convert a single identifier from camelCase or CamelCase to snake_case.
/// e.g. "userId" -> "user_id", "SchoolModel" -> "school_model"
pub fn to_snake_case(s: &str) -> String {
    to_snake_case_with(s, false)
}

/// Like [`to_snake_case`], but when `keep_leading_underscore` is set the underscore produced by a
/// leading capital (or already present) is kept: "Model" -> "_model".
pub fn to_snake_case_with(s: &str, keep_leading_underscore: bool) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if c.is_uppercase() {
            out.push('_');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    if !keep_leading_underscore && out.starts_with('_') {
        out.remove(0);
    }
    out
}

/// Capitalize the first letter of every word. e.g. "hello world" -> "Hello World"
pub fn to_title_case(s: &str) -> String {
    WORD_START
        .replace_all(s, |caps: &regex::Captures<'_>| caps[0].to_uppercase())
        .into_owned()
}

/// Replace each whitespace character with a dot and lowercase. e.g. "Hello World" -> "hello.world"
pub fn to_dot_case(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_whitespace() { '.' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Split camelCase into a sentence. e.g. "firstName" -> "First name"
pub fn to_normal_case(s: &str) -> String {
    let mut spaced = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
    }
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

/// URL slug: drops combining diacritical marks, lowercases and joins whitespace runs with '-'.
/// Precomposed characters are kept as-is; only decomposed marks (U+0300..U+036F) are removed.
pub fn to_slug(s: &str) -> String {
    let stripped: String = s
        .chars()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect::<String>()
        .to_lowercase();
    WHITESPACE_RUN.replace_all(&stripped, "-").into_owned()
}

/// Convert all keys of a JSON object from snake_case to camelCase (in place).
/// Used for outgoing bodies when the backend speaks camelCase.
pub fn object_keys_to_camel_case(obj: &mut Map<String, Value>) {
    let keys: Vec<String> = obj.keys().cloned().collect();
    for k in keys {
        let camel = to_camel_case(&k);
        if camel != k {
            if let Some(v) = obj.remove(&k) {
                obj.insert(camel, v);
            }
        }
    }
}

/// Convert all keys of a JSON object from camelCase to snake_case (in place).
/// Used for incoming records so local field names stay snake_case.
pub fn object_keys_to_snake_case(obj: &mut Map<String, Value>) {
    let keys: Vec<String> = obj.keys().cloned().collect();
    for k in keys {
        let snake = to_snake_case(&k);
        if snake != k {
            if let Some(v) = obj.remove(&k) {
                obj.insert(snake, v);
            }
        }
    }
}

/// Recursively apply camelCase to all object keys in a Value (objects and arrays of objects).
pub fn value_keys_to_camel_case_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            object_keys_to_camel_case(map);
            for (_, v) in map.iter_mut() {
                value_keys_to_camel_case_recursive(v);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                value_keys_to_camel_case_recursive(v);
            }
        }
        _ => {}
    }
}

/// Recursively apply snake_case to all object keys in a Value (objects and arrays of objects).
pub fn value_keys_to_snake_case_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            object_keys_to_snake_case(map);
            for (_, v) in map.iter_mut() {
                value_keys_to_snake_case_recursive(v);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                value_keys_to_snake_case_recursive(v);
            }
        }
        _ => {}
    }
}
