//! Target-shape contracts for structured output.

use super::CoerceError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Expected JSON type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Boolean,
    Integer,
    Number,
    Array,
    Object,
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    fn json_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    fn example(self) -> Value {
        match self {
            Self::String => json!("text"),
            Self::Boolean => json!(false),
            Self::Integer => json!(0),
            Self::Number => json!(0.0),
            Self::Array => json!([]),
            Self::Object => json!({}),
        }
    }
}

/// One field of a schema contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldContract {
    pub name: String,
    pub field_type: FieldType,
    /// Enumerated value set, for string fields with a closed vocabulary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    pub required: bool,
}

impl FieldContract {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            allowed: None,
            required: true,
        }
    }

    pub fn allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A target shape description: field names, types, enumerated value sets,
/// required-ness. Never mutated by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaContract {
    pub name: String,
    pub fields: Vec<FieldContract>,
}

impl SchemaContract {
    pub fn new(name: impl Into<String>, fields: Vec<FieldContract>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// The plan shape used by the orchestrating planner.
    pub fn plan() -> Self {
        Self::new(
            "plan",
            vec![
                FieldContract::new("steps", FieldType::Array),
                FieldContract::new("is_complete", FieldType::Boolean),
            ],
        )
    }

    /// The evaluation shape used by the quality evaluator.
    pub fn evaluation() -> Self {
        Self::new(
            "evaluation",
            vec![
                FieldContract::new("rating", FieldType::String).allowed(["0", "1", "2", "3"]),
                FieldContract::new("feedback", FieldType::String),
                FieldContract::new("needs_improvement", FieldType::Boolean),
            ],
        )
    }

    pub fn field(&self, name: &str) -> Option<&FieldContract> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_fields(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.field(n).is_some())
    }

    pub fn required_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Check a candidate object against this contract.
    pub fn validate(&self, value: &Value) -> Result<(), CoerceError> {
        let Some(object) = value.as_object() else {
            return Err(CoerceError::Invalid("not an object".into()));
        };
        for field in &self.fields {
            let Some(found) = object.get(&field.name) else {
                if field.required {
                    return Err(CoerceError::Invalid(format!(
                        "missing required field '{}'",
                        field.name
                    )));
                }
                continue;
            };
            if !field.field_type.matches(found) {
                return Err(CoerceError::Invalid(format!(
                    "field '{}' is not a {}",
                    field.name,
                    field.field_type.json_name()
                )));
            }
            if let (Some(allowed), Some(s)) = (&field.allowed, found.as_str()) {
                if !allowed.iter().any(|a| a == s) {
                    return Err(CoerceError::Invalid(format!(
                        "field '{}' value '{s}' not in allowed set",
                        field.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Render as a JSON Schema object for provider response-format hints.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(field.field_type.json_name()));
            if let Some(allowed) = &field.allowed {
                prop.insert("enum".into(), json!(allowed));
            }
            properties.insert(field.name.clone(), Value::Object(prop));
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required_names(),
            "additionalProperties": false,
        })
    }

    /// A minimal literal instance, used in reprompts.
    pub fn example(&self) -> Value {
        let mut object = Map::new();
        for field in &self.fields {
            let value = match &field.allowed {
                Some(allowed) if !allowed.is_empty() => json!(allowed[0]),
                _ => field.field_type.example(),
            };
            object.insert(field.name.clone(), value);
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_required_and_types() {
        let schema = SchemaContract::evaluation();
        let good = json!({"rating": "2", "feedback": "fine", "needs_improvement": false});
        assert!(schema.validate(&good).is_ok());

        let missing = json!({"rating": "2", "feedback": "fine"});
        assert!(schema.validate(&missing).is_err());

        let wrong_type = json!({"rating": 2, "feedback": "fine", "needs_improvement": false});
        assert!(schema.validate(&wrong_type).is_err());
    }

    #[test]
    fn enforces_allowed_values() {
        let schema = SchemaContract::evaluation();
        let out_of_set = json!({"rating": "9", "feedback": "x", "needs_improvement": true});
        assert!(schema.validate(&out_of_set).is_err());
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let schema = SchemaContract::new(
            "partial",
            vec![
                FieldContract::new("a", FieldType::String),
                FieldContract::new("b", FieldType::String).optional(),
            ],
        );
        assert!(schema.validate(&json!({"a": "x"})).is_ok());
    }

    #[test]
    fn json_schema_rendering() {
        let schema = SchemaContract::plan().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["steps", "is_complete"]));
        assert_eq!(schema["properties"]["steps"]["type"], "array");
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn example_prefers_allowed_values() {
        let example = SchemaContract::evaluation().example();
        assert_eq!(example["rating"], "0");
        assert_eq!(example["needs_improvement"], json!(false));
    }
}
