//! Schema shape registry.
//!
//! Known schema shapes get a normalizer that remaps label variants to
//! canonical values, plus a conservative last-resort default. The shape is
//! detected once from the schema's field set; adding a shape means adding a
//! variant here, not another branch in the dispatch path.

use serde_json::{Value, json};

/// Agents a plan is allowed to reference.
const KNOWN_AGENTS: &[&str] = &[
    "research_quality_controller",
    "financial_analyst",
    "report_writer",
];

const TRUTHY: &[&str] = &[
    "true", "1", "yes", "on", "complete", "completed", "done", "finished", "success",
];

use super::SchemaContract;

/// Recognized schema shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Planner output: `steps` + `is_complete`.
    Plan,
    /// Evaluator output: `rating` + `needs_improvement`.
    Evaluation,
    /// Anything else; validated but not normalized.
    Other,
}

impl Shape {
    /// Inspect the schema's field set once to pick the shape.
    pub fn detect(schema: &SchemaContract) -> Self {
        if schema.has_fields(&["steps", "is_complete"]) {
            Self::Plan
        } else if schema.has_fields(&["rating", "needs_improvement"]) {
            Self::Evaluation
        } else {
            Self::Other
        }
    }

    /// Remap label variants to canonical values for this shape.
    pub fn normalize(self, value: Value) -> Value {
        match self {
            Self::Plan => normalize_plan(value),
            Self::Evaluation => normalize_evaluation(value),
            Self::Other => value,
        }
    }

    /// A conservative, explicitly-labeled default so the caller can make
    /// forward progress rather than fail outright.
    pub fn last_resort(self) -> Option<Value> {
        match self {
            Self::Plan => Some(json!({
                "steps": [
                    {
                        "description": "Collect high-quality research",
                        "tasks": [
                            {"description": "Gather data", "agent": "research_quality_controller"}
                        ]
                    },
                    {
                        "description": "Analyze research data",
                        "tasks": [{"description": "Analyze", "agent": "financial_analyst"}]
                    },
                    {
                        "description": "Write and save report",
                        "tasks": [{"description": "Write and save", "agent": "report_writer"}]
                    }
                ],
                "is_complete": false,
            })),
            Self::Evaluation => Some(json!({
                "rating": "1",
                "feedback": "Auto-coerced from unstructured evaluator text.",
                "needs_improvement": true,
            })),
            Self::Other => None,
        }
    }
}

fn truthy(s: &str) -> bool {
    TRUTHY.contains(&s.trim().to_ascii_lowercase().as_str())
}

fn to_snake(s: &str) -> String {
    let cleaned = s.replace(['-', '/', '.'], " ");
    let parts: Vec<&str> = cleaned.split_whitespace().collect();
    if parts.is_empty() {
        s.trim().to_string()
    } else {
        parts.join("_").to_ascii_lowercase()
    }
}

fn map_agent(agent: &Value) -> String {
    let Some(name) = agent.as_str() else {
        return KNOWN_AGENTS[0].to_string();
    };
    let lower = name.to_ascii_lowercase();
    if lower.contains("evaluatoroptimizer") || lower.contains("research_quality") {
        "research_quality_controller".into()
    } else if lower.contains("financial") && lower.contains("analyst") {
        "financial_analyst".into()
    } else if lower.contains("report") && lower.contains("writer") {
        "report_writer".into()
    } else {
        to_snake(name)
    }
}

/// Normalize common planner variants: `subtasks`→`tasks`, agent aliases to
/// the allow-list, `is_complete` coerced from string or alternate keys, and
/// an empty plan defaulting to complete.
fn normalize_plan(value: Value) -> Value {
    let Value::Object(object) = value else {
        return json!({"steps": [], "is_complete": false});
    };
    let mut out = object.clone();

    let raw_steps = object.get("steps").and_then(Value::as_array);
    let mut steps: Vec<Value> = Vec::new();
    for step in raw_steps.into_iter().flatten() {
        let Some(step) = step.as_object() else {
            continue;
        };
        let tasks = step
            .get("tasks")
            .or_else(|| step.get("subtasks"))
            .and_then(Value::as_array);
        let tasks: Vec<Value> = tasks
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .map(|task| {
                json!({
                    "description": task.get("description").cloned().unwrap_or(Value::Null),
                    "agent": map_agent(task.get("agent").unwrap_or(&Value::Null)),
                })
            })
            .collect();
        steps.push(json!({
            "description": step.get("description").cloned().unwrap_or(Value::Null),
            "tasks": tasks,
        }));
    }

    let raw_complete = object.get("is_complete").cloned().or_else(|| {
        ["isComplete", "complete", "completed", "done", "status"]
            .iter()
            .find_map(|alt| object.get(*alt).cloned())
    });
    let mut is_complete = match raw_complete {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => truthy(&s),
        _ => false,
    };
    // A plan with no remaining steps is done by definition.
    if steps.is_empty() && !is_complete {
        is_complete = true;
    }

    out.insert("steps".into(), Value::Array(steps));
    out.insert("is_complete".into(), Value::Bool(is_complete));
    Value::Object(out)
}

/// Normalize evaluator variants: rating labels or numbers to ordinal-string
/// codes, boolean-ish strings to real booleans.
fn normalize_evaluation(value: Value) -> Value {
    let Value::Object(mut out) = value else {
        return value;
    };
    if let Some(rating) = out.get("rating").cloned() {
        let code = match rating {
            Value::String(s) => {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    "POOR" => Some("0"),
                    "FAIR" => Some("1"),
                    "GOOD" => Some("2"),
                    "EXCELLENT" => Some("3"),
                    "0" | "1" | "2" | "3" => None, // already canonical
                    _ => Some("1"),
                }
                .map(str::to_string)
            }
            Value::Number(n) => {
                let code = n
                    .as_i64()
                    .filter(|i| (0..=3).contains(i))
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "1".into());
                Some(code)
            }
            _ => None,
        };
        if let Some(code) = code {
            out.insert("rating".into(), Value::String(code));
        }
    }
    if let Some(Value::String(s)) = out.get("needs_improvement").cloned() {
        out.insert("needs_improvement".into(), Value::Bool(truthy(&s)));
    }
    Value::Object(out)
}

/// Coerce an evaluation object out of free prose by pattern search.
///
/// Looks for a `quality rating:`/`overall rating:` label and an
/// `improvement needed:` yes/no; the prose itself becomes the feedback.
pub fn evaluation_from_text(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    let lower = text.to_ascii_lowercase();
    let mut rating = token_after(&lower, "quality rating")
        .or_else(|| token_after(&lower, "overall rating"))
        .map(|t| t.to_ascii_uppercase());

    let needs = token_after(&lower, "improvement needed")
        .map(|t| matches!(t.as_str(), "true" | "yes"));

    if rating.is_none() {
        rating = match needs {
            Some(true) => Some("FAIR".into()),
            Some(false) => Some("GOOD".into()),
            None => None,
        };
    }
    let rating = rating?;
    let code = match rating.as_str() {
        "POOR" => "0",
        "FAIR" => "1",
        "GOOD" => "2",
        "EXCELLENT" => "3",
        _ => "1",
    };
    Some(json!({
        "rating": code,
        "feedback": text,
        "needs_improvement": needs.unwrap_or(true),
    }))
}

/// The first word-like token after `marker` (skipping spaces and a colon).
fn token_after(haystack: &str, marker: &str) -> Option<String> {
    let at = haystack.find(marker)? + marker.len();
    let rest = haystack[at..].trim_start_matches([' ', '\t', ':']);
    let token: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_shapes_from_field_sets() {
        assert_eq!(Shape::detect(&SchemaContract::plan()), Shape::Plan);
        assert_eq!(Shape::detect(&SchemaContract::evaluation()), Shape::Evaluation);
        let other = SchemaContract::new("other", vec![]);
        assert_eq!(Shape::detect(&other), Shape::Other);
    }

    #[test]
    fn plan_subtasks_renamed_and_agents_mapped() {
        let raw = json!({
            "steps": [{
                "description": "step",
                "subtasks": [
                    {"description": "t1", "agent": "Financial Analyst"},
                    {"description": "t2", "agent": "EvaluatorOptimizerLLM"},
                    {"description": "t3", "agent": "Some-Other/Agent"}
                ]
            }],
            "is_complete": "no"
        });
        let plan = Shape::Plan.normalize(raw);
        let tasks = plan["steps"][0]["tasks"].as_array().unwrap();
        assert_eq!(tasks[0]["agent"], "financial_analyst");
        assert_eq!(tasks[1]["agent"], "research_quality_controller");
        assert_eq!(tasks[2]["agent"], "some_other_agent");
        assert_eq!(plan["is_complete"], json!(false));
    }

    #[test]
    fn plan_alternate_completion_keys() {
        let plan = Shape::Plan.normalize(json!({"steps": [{"description": "s", "tasks": []}], "status": "done"}));
        assert_eq!(plan["is_complete"], json!(true));
    }

    #[test]
    fn empty_plan_defaults_to_complete() {
        let plan = Shape::Plan.normalize(json!({"steps": []}));
        assert_eq!(plan["is_complete"], json!(true));
    }

    #[test]
    fn non_object_plan_becomes_empty_incomplete() {
        let plan = Shape::Plan.normalize(json!("nope"));
        assert_eq!(plan, json!({"steps": [], "is_complete": false}));
    }

    #[test]
    fn evaluation_labels_and_numbers_remapped() {
        let eval = Shape::Evaluation.normalize(json!({
            "rating": "EXCELLENT", "feedback": "x", "needs_improvement": "no"
        }));
        assert_eq!(eval["rating"], "3");
        assert_eq!(eval["needs_improvement"], json!(false));

        let eval = Shape::Evaluation.normalize(json!({
            "rating": 2, "feedback": "x", "needs_improvement": true
        }));
        assert_eq!(eval["rating"], "2");

        let eval = Shape::Evaluation.normalize(json!({
            "rating": 17, "feedback": "x", "needs_improvement": true
        }));
        assert_eq!(eval["rating"], "1");
    }

    #[test]
    fn free_text_evaluation_extraction() {
        let text = "Quality rating: GOOD\nSome remarks.\nImprovement needed: no";
        let eval = evaluation_from_text(text).unwrap();
        assert_eq!(eval["rating"], "2");
        assert_eq!(eval["needs_improvement"], json!(false));
        assert_eq!(eval["feedback"], json!(text));
    }

    #[test]
    fn free_text_without_rating_uses_needs_hint() {
        let eval = evaluation_from_text("Improvement needed: yes").unwrap();
        assert_eq!(eval["rating"], "1"); // FAIR
        assert_eq!(eval["needs_improvement"], json!(true));
    }

    #[test]
    fn free_text_with_nothing_is_none() {
        assert!(evaluation_from_text("nothing to see").is_none());
        assert!(evaluation_from_text("   ").is_none());
    }

    #[test]
    fn last_resort_defaults() {
        let plan = Shape::Plan.last_resort().unwrap();
        assert_eq!(plan["steps"].as_array().unwrap().len(), 3);
        assert_eq!(plan["is_complete"], json!(false));

        let eval = Shape::Evaluation.last_resort().unwrap();
        assert_eq!(eval["needs_improvement"], json!(true));

        assert!(Shape::Other.last_resort().is_none());
    }
}
