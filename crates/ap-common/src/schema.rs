//! Self-describing configuration schemas.
//!
//! Returned by `get_action_config` / `get_trigger_config` so the host agent
//! can render forms and pre-validate options before calling `initialize`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Version of the line protocol spoken by every plugin.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// JSON type name(s) accepted for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldType {
    Single(String),
    Union(Vec<String>),
}

/// Description of one option or parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
}

impl FieldSpec {
    pub fn new(field_type: &str, description: &str) -> Self {
        Self {
            field_type: FieldType::Single(field_type.to_string()),
            description: description.to_string(),
            required: false,
            default: None,
            minimum: None,
            maximum: None,
            max_length: None,
            items: None,
            examples: Vec::new(),
        }
    }

    /// Field accepting several JSON types (e.g. a string or a list of strings).
    pub fn union(field_types: &[&str], description: &str) -> Self {
        let mut spec = Self::new("", description);
        spec.field_type =
            FieldType::Union(field_types.iter().map(|t| t.to_string()).collect());
        spec
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn minimum(mut self, value: impl Into<Value>) -> Self {
        self.minimum = Some(value.into());
        self
    }

    pub fn maximum(mut self, value: impl Into<Value>) -> Self {
        self.maximum = Some(value.into());
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn items(mut self, item_type: &str) -> Self {
        self.items = Some(serde_json::json!({ "type": item_type }));
        self
    }

    pub fn examples<I: IntoIterator<Item = Value>>(mut self, examples: I) -> Self {
        self.examples = examples.into_iter().collect();
        self
    }
}

/// Full schema for one plugin's options or request parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    pub schema: BTreeMap<String, FieldSpec>,
    pub required: Vec<String>,
    pub examples: Vec<Value>,
    pub description: String,
    /// Upper bound (seconds) the host should allow for one request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ConfigSchema {
    pub fn new(description: &str) -> Self {
        Self {
            schema: BTreeMap::new(),
            required: Vec::new(),
            examples: Vec::new(),
            description: description.to_string(),
            timeout: None,
        }
    }

    /// Add a field. Required fields are also listed in `required`.
    pub fn field(mut self, name: &str, spec: FieldSpec) -> Self {
        if spec.required {
            self.required.push(name.to_string());
        }
        self.schema.insert(name.to_string(), spec);
        self
    }

    pub fn example(mut self, example: Value) -> Self {
        self.examples.push(example);
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_fields_listed() {
        let schema = ConfigSchema::new("demo")
            .field("command", FieldSpec::new("string", "cmd").required())
            .field("timeout", FieldSpec::new("integer", "secs").default_value(300));
        assert_eq!(schema.required, vec!["command".to_string()]);
        assert_eq!(schema.schema.len(), 2);
    }

    #[test]
    fn test_union_type_serializes_as_array() {
        let spec = FieldSpec::union(&["string", "array"], "recipients");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], json!(["string", "array"]));
        assert!(json.get("default").is_none());
        assert!(json.get("examples").is_none());
    }

    #[test]
    fn test_schema_wire_shape() {
        let schema = ConfigSchema::new("Disk space monitoring configuration")
            .field(
                "threshold",
                FieldSpec::new("number", "pct")
                    .default_value(85.0)
                    .minimum(0.0)
                    .maximum(100.0),
            )
            .example(json!({"threshold": 85.0}));
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["schema"]["threshold"]["type"], "number");
        assert_eq!(json["schema"]["threshold"]["maximum"], 100.0);
        assert_eq!(json["required"], json!([]));
        assert!(json.get("timeout").is_none());
    }
}
