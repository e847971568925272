//! Fetch-argument augmentation.
//!
//! Fetch-style tools frequently truncate aggressively or return binary
//! payloads as-is. Before invoking one, the loop raises its `max_length`
//! to a usable floor and, for PDF targets, sets whatever text-extraction
//! hints the tool's schema advertises.

use crate::model::ToolSpec;
use serde_json::{Map, Value};

const URL_KEYS: &[&str] = &["url", "uri", "href"];

/// Whether this tool name indicates a fetch-style tool.
pub fn is_fetch_tool(name: &str) -> bool {
    name.to_ascii_lowercase().contains("fetch")
}

/// Find the URL argument of a tool call, if any.
pub fn url_argument(arguments: &Map<String, Value>) -> Option<&str> {
    URL_KEYS
        .iter()
        .find_map(|k| arguments.get(*k))
        .and_then(Value::as_str)
}

/// Shape fetch arguments in place. No-op for non-fetch tools.
pub fn augment_fetch_args(
    name: &str,
    arguments: &mut Map<String, Value>,
    specs: &[ToolSpec],
    min_fetch_length: u64,
) {
    if !is_fetch_tool(name) {
        return;
    }
    let props = schema_properties(name, specs);

    let has_max_length =
        arguments.contains_key("max_length") || props.is_some_and(|p| p.contains_key("max_length"));
    if has_max_length {
        let current = arguments
            .get("max_length")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if current < min_fetch_length {
            arguments.insert("max_length".into(), Value::from(min_fetch_length));
        }
    }

    let is_pdf = url_argument(arguments).is_some_and(extract::looks_like_document);
    if !is_pdf {
        return;
    }
    let Some(props) = props else { return };

    // Hint the server to return plain text where its schema supports it.
    if props.contains_key("extract_text") && !arguments.contains_key("extract_text") {
        arguments.insert("extract_text".into(), Value::Bool(true));
    }
    if props.contains_key("as_text") && !arguments.contains_key("as_text") {
        arguments.insert("as_text".into(), Value::Bool(true));
    }
    if props.contains_key("format") && !arguments.contains_key("format") {
        arguments.insert("format".into(), Value::from("text"));
    }
    if props.contains_key("mime") && !arguments.contains_key("mime") {
        arguments.insert("mime".into(), Value::from("text/plain"));
    }
    if props.contains_key("encoding")
        && arguments.get("encoding").and_then(Value::as_str).is_none()
    {
        arguments.insert("encoding".into(), Value::from("utf-8"));
    }
}

fn schema_properties<'a>(name: &str, specs: &'a [ToolSpec]) -> Option<&'a Map<String, Value>> {
    specs
        .iter()
        .find(|s| s.name == name)
        .and_then(|s| s.schema.get("properties"))
        .and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fetch_spec(props: Value) -> ToolSpec {
        ToolSpec {
            name: "fetch".into(),
            description: "fetch a url".into(),
            schema: json!({"type": "object", "properties": props}),
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn non_fetch_tools_untouched() {
        let specs = [fetch_spec(json!({"url": {}, "max_length": {}}))];
        let mut a = args(json!({"term": "X"}));
        augment_fetch_args("lookup", &mut a, &specs, 5000);
        assert_eq!(a, args(json!({"term": "X"})));
    }

    #[test]
    fn max_length_raised_to_floor() {
        let specs = [fetch_spec(json!({"url": {}, "max_length": {}}))];
        let mut a = args(json!({"url": "https://x.test/page", "max_length": 100}));
        augment_fetch_args("fetch", &mut a, &specs, 5000);
        assert_eq!(a.get("max_length").and_then(Value::as_u64), Some(5000));
    }

    #[test]
    fn generous_max_length_kept() {
        let specs = [fetch_spec(json!({"url": {}, "max_length": {}}))];
        let mut a = args(json!({"url": "https://x.test/page", "max_length": 9000}));
        augment_fetch_args("fetch", &mut a, &specs, 5000);
        assert_eq!(a.get("max_length").and_then(Value::as_u64), Some(9000));
    }

    #[test]
    fn pdf_hints_follow_schema() {
        let specs = [fetch_spec(json!({"url": {}, "format": {}, "extract_text": {}}))];
        let mut a = args(json!({"url": "https://x.test/doc.pdf"}));
        augment_fetch_args("fetch", &mut a, &specs, 5000);
        assert_eq!(a.get("extract_text"), Some(&Value::Bool(true)));
        assert_eq!(a.get("format").and_then(Value::as_str), Some("text"));
        // Not advertised by the schema, so never set.
        assert!(!a.contains_key("as_text"));
    }

    #[test]
    fn html_url_gets_no_pdf_hints() {
        let specs = [fetch_spec(json!({"url": {}, "format": {}}))];
        let mut a = args(json!({"url": "https://x.test/page.html"}));
        augment_fetch_args("fetch", &mut a, &specs, 5000);
        assert!(!a.contains_key("format"));
    }
}
