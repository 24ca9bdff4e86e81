//! Presence checks and property helpers over loosely typed JSON values.
//!
//! Server payloads arrive as `serde_json::Value`; these helpers never fail,
//! they fall back to `None`/`false` so lookups can be chained freely.

use serde_json::{Map, Value};
use std::borrow::Cow;

/// True when a value was supplied and is not JSON `null`.
///
/// Distinguishes "not sent" from "explicitly provided", including falsy
/// values such as `0`, `false` and `""`.
pub fn is(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

/// Look up `name` on `obj`, falling back to a case-insensitive scan.
///
/// The exact key always wins. With `ignore_case`, the first key (in
/// insertion order) whose uppercased form matches is returned.
pub fn get_prop_value<'a>(
    obj: Option<&'a Value>,
    name: Option<&str>,
    ignore_case: bool,
    default: Option<&'a Value>,
) -> Option<&'a Value> {
    let (Some(Value::Object(map)), Some(name)) = (obj, name) else {
        return default;
    };

    if let Some(value) = map.get(name) {
        return Some(value);
    }

    if ignore_case {
        let wanted = name.to_uppercase();
        if let Some((_, value)) = map.iter().find(|(key, _)| key.to_uppercase() == wanted) {
            return Some(value);
        }
    }

    default
}

/// Find the item whose `prop_name` equals `value`, scanning from the end.
///
/// The last matching item wins when several share the value.
pub fn find_by_prop<'a>(
    items: &'a [Value],
    prop_name: &str,
    value: &Value,
    ignore_prop_case: bool,
    ignore_value_case: bool,
) -> Option<&'a Value> {
    items.iter().rev().find(|item| {
        get_prop_value(Some(*item), Some(prop_name), ignore_prop_case, None)
            .is_some_and(|prop| values_match(prop, value, ignore_value_case))
    })
}

fn values_match(left: &Value, right: &Value, ignore_case: bool) -> bool {
    match (left, right) {
        (Value::String(l), Value::String(r)) if ignore_case => l.to_uppercase() == r.to_uppercase(),
        _ => left == right,
    }
}

/// New object carrying the same top-level entries as `value`.
///
/// Non-object values are returned as-is; absent values become `null`.
pub fn shallow_clone(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Object(map)) => {
            let mut copy = Map::with_capacity(map.len());
            copy_props(&mut copy, Some(map));
            Value::Object(copy)
        }
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

/// Copy every entry of `source` onto `target`, replacing existing keys.
pub fn copy_props<'a>(
    target: &'a mut Map<String, Value>,
    source: Option<&Map<String, Value>>,
) -> &'a mut Map<String, Value> {
    if let Some(source) = source {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    target
}

/// Patch `target` with `source` and return the values that were replaced.
///
/// Only keys that already existed on `target` get an entry in the returned
/// base map, so passing it back to `override_props` restores them.
pub fn override_props(
    target: &mut Map<String, Value>,
    source: &Map<String, Value>,
) -> Map<String, Value> {
    let mut base = Map::new();
    for (key, value) in source {
        if let Some(previous) = target.insert(key.clone(), value.clone()) {
            base.insert(key.clone(), previous);
        }
    }
    base
}

/// Case-insensitive GUID comparison over JSON values.
///
/// Anything but two strings compares unequal. `a_is_upper`/`b_is_upper`
/// skip uppercasing a side the caller already normalized; a false
/// assertion yields a wrong answer rather than an error.
pub fn guid_equals(a: &Value, b: &Value, a_is_upper: bool, b_is_upper: bool) -> bool {
    match (a, b) {
        (Value::String(a), Value::String(b)) => guid_str_equals(a, b, a_is_upper, b_is_upper),
        _ => false,
    }
}

/// String form of [`guid_equals`].
pub fn guid_str_equals(a: &str, b: &str, a_is_upper: bool, b_is_upper: bool) -> bool {
    upper(a, a_is_upper) == upper(b, b_is_upper)
}

fn upper(s: &str, already_upper: bool) -> Cow<'_, str> {
    if already_upper {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.to_uppercase())
    }
}

/// Suffix test that is false for non-string input.
pub fn ends_with(value: &Value, suffix: &Value) -> bool {
    match (value, suffix) {
        (Value::String(s), Value::String(suffix)) => s.ends_with(suffix.as_str()),
        _ => false,
    }
}

/// Escape regex metacharacters so `text` matches literally.
pub fn escape_reg_exp(text: &str) -> String {
    regex::escape(text)
}
