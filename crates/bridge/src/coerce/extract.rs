//! Heuristic JSON extraction from prose-wrapped model output.

use serde_json::Value;

/// Pull a JSON object out of `text`.
///
/// Tries a direct parse first, then the widest first-`{`-to-last-`}`
/// substring, then the first balanced `{...}` block. Returns `None` when no
/// candidate parses as an object.
pub fn extract_json_object(text: &str) -> Option<Value> {
    if let Some(value) = parse_object(text) {
        return Some(value);
    }
    if let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) {
        if last > first {
            if let Some(value) = parse_object(&text[first..=last]) {
                return Some(value);
            }
        }
    }
    first_balanced_object(text).and_then(|s| parse_object(s))
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

/// Scan for the first balanced top-level object, tracking string literals so
/// braces inside them don't count.
fn first_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
