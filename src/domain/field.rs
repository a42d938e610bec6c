// Field descriptor domain model
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Semantic type of a discovered or user-configured field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Date,
    Currency,
    Percentage,
}

impl FieldType {
    /// Runtime type of a JSON value. `null` is classified as `Object`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null | Value::Object(_) => FieldType::Object,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(_) => FieldType::Number,
            Value::String(_) => FieldType::String,
            Value::Array(_) => FieldType::Array,
        }
    }
}

/// One addressable value inside a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    pub path: Vec<String>,
}

impl FieldDescriptor {
    pub fn new(key: String, label: String, field_type: FieldType, path: Vec<String>) -> Self {
        Self {
            key,
            label,
            field_type: Some(field_type),
            path,
        }
    }

    pub fn key_mentions_time(&self) -> bool {
        let key = self.key.to_lowercase();
        key.contains("date") || key.contains("time")
    }

    /// Date-like fields drive chart labels rather than datasets.
    pub fn is_temporal(&self) -> bool {
        self.field_type == Some(FieldType::Date) || self.key_mentions_time()
    }
}

/// A descriptor together with the value it was sampled from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOption {
    #[serde(flatten)]
    pub descriptor: FieldDescriptor,
    pub value: Value,
}
