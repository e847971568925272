//! Canonical cache keys for tool calls.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Argument fields that cannot affect a tool's result. Calls differing only
/// in these share a cache entry.
const VOLATILE_FIELDS: &[&str] = &["timeout", "debug"];

/// Derive a deterministic cache key from a tool name and its arguments.
///
/// Volatile fields are dropped and the remaining arguments serialized with
/// sorted keys, so argument ordering never produces distinct keys.
pub fn canonical_key(name: &str, arguments: &Map<String, Value>) -> String {
    let filtered: BTreeMap<&str, &Value> = arguments
        .iter()
        .filter(|(k, _)| !VOLATILE_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.as_str(), v))
        .collect();

    // BTreeMap serialization is ordered; failure is unreachable for Value
    // trees but fall back to the empty object rather than panic.
    let args_json = serde_json::to_string(&filtered).unwrap_or_else(|_| "{}".into());
    format!("{name}:{args_json}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn volatile_fields_ignored() {
        let a = args(json!({"term": "X", "timeout": 30}));
        let b = args(json!({"term": "X", "timeout": 600, "debug": true}));
        assert_eq!(canonical_key("lookup", &a), canonical_key("lookup", &b));
    }

    #[test]
    fn key_is_order_independent() {
        let a = args(json!({"url": "https://a", "max_length": 5000}));
        let b = args(json!({"max_length": 5000, "url": "https://a"}));
        assert_eq!(canonical_key("fetch", &a), canonical_key("fetch", &b));
    }

    #[test]
    fn different_arguments_differ() {
        let a = args(json!({"term": "X"}));
        let b = args(json!({"term": "Y"}));
        assert_ne!(canonical_key("lookup", &a), canonical_key("lookup", &b));
    }

    #[test]
    fn example_scenario_key() {
        let a = args(json!({"term": "X"}));
        assert_eq!(canonical_key("lookup", &a), r#"lookup:{"term":"X"}"#);
    }
}
