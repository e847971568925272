//! Aggregate pseudo-tool-call unpacking.
//!
//! Some providers batch several tool calls into one synthetic call whose
//! arguments embed a nested list of real calls. Detection is isolated here
//! so other providers' batching quirks can be added without touching the
//! dispatch loop.

use crate::model::ToolCallRequest;
use serde_json::{Map, Value};
use tracing::debug;

/// Synthetic names a batched call arrives under.
const AGGREGATE_NAMES: &[&str] = &[
    "multi_tool_use.parallel",
    "multi_tool_use.serial",
    "functions.multi_tool_use.parallel",
];

/// Keys the nested call list hides under.
const NESTED_KEYS: &[&str] = &["tool_calls", "calls"];

pub fn is_aggregate(name: &str) -> bool {
    AGGREGATE_NAMES.contains(&name.to_ascii_lowercase().as_str())
}

/// Flatten a list of tool calls, expanding any aggregate entries in place.
/// Nested order is preserved; malformed nested entries are skipped.
pub fn unpack_aggregates(calls: Vec<ToolCallRequest>) -> Vec<ToolCallRequest> {
    let mut out = Vec::with_capacity(calls.len());
    for call in calls {
        if is_aggregate(&call.name) {
            out.extend(unpack_one(&call));
        } else {
            out.push(call);
        }
    }
    out
}

fn unpack_one(call: &ToolCallRequest) -> Vec<ToolCallRequest> {
    let nested = NESTED_KEYS
        .iter()
        .find_map(|k| call.arguments.get(*k))
        .and_then(Value::as_array);
    let Some(nested) = nested else {
        debug!(name = %call.name, "aggregate call carries no nested list");
        return Vec::new();
    };

    let mut out = Vec::new();
    for entry in nested {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        let id = entry
            .get("id")
            .or_else(|| entry.get("call_id"))
            .and_then(Value::as_str);
        let name = entry.get("name").and_then(Value::as_str);
        let (Some(id), Some(name)) = (id, name) else {
            debug!("skipping nested call without id or name");
            continue;
        };
        out.push(ToolCallRequest {
            id: id.to_string(),
            name: name.to_string(),
            arguments: nested_arguments(entry.get("arguments")),
        });
    }
    out
}

/// Nested arguments arrive as an object or a JSON-encoded string.
fn nested_arguments(raw: Option<&Value>) -> Map<String, Value> {
    match raw {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default(),
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: "call_0".into(),
            name: name.into(),
            arguments: args.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn plain_calls_pass_through() {
        let calls = vec![call("lookup", json!({"term": "X"}))];
        let out = unpack_aggregates(calls.clone());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "lookup");
    }

    #[test]
    fn nested_calls_expand_in_order() {
        let agg = call(
            "multi_tool_use.parallel",
            json!({"tool_calls": [
                {"id": "call_1", "name": "fetch", "arguments": {"url": "https://a.test"}},
                {"id": "call_2", "name": "lookup", "arguments": "{\"term\": \"X\"}"}
            ]}),
        );
        let out = unpack_aggregates(vec![agg]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "call_1");
        assert_eq!(out[0].name, "fetch");
        assert_eq!(out[1].id, "call_2");
        assert_eq!(out[1].arguments.get("term"), Some(&json!("X")));
    }

    #[test]
    fn calls_key_and_call_id_alias_accepted() {
        let agg = call(
            "multi_tool_use.serial",
            json!({"calls": [
                {"call_id": "call_9", "name": "lookup", "arguments": {"term": "Y"}}
            ]}),
        );
        let out = unpack_aggregates(vec![agg]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "call_9");
    }

    #[test]
    fn malformed_entries_skipped() {
        let agg = call(
            "functions.multi_tool_use.parallel",
            json!({"tool_calls": [
                {"name": "no-id"},
                {"id": "call_1"},
                "not an object",
                {"id": "call_2", "name": "lookup", "arguments": "not json"}
            ]}),
        );
        let out = unpack_aggregates(vec![agg]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "call_2");
        assert!(out[0].arguments.is_empty());
    }

    #[test]
    fn aggregate_without_nested_list_yields_nothing() {
        let agg = call("multi_tool_use.parallel", json!({"oops": true}));
        assert!(unpack_aggregates(vec![agg]).is_empty());
    }
}
