//! Access to the raw data of a submitted form.

use serde_json::{Map, Value as Json};

use crate::error::MappingError;
use crate::value::Value;

/// The `data` object of a submission payload.
///
/// Payloads look like `{"data": {"meta": {"instanceID": "..."}, ...fields}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: Map<String, Json>,
}

impl FormData {
    #[must_use]
    pub fn new(fields: Map<String, Json>) -> Self {
        Self { fields }
    }

    /// Extract the `data` object from a parsed payload.
    pub fn from_payload(payload: &Json) -> Result<Self, MappingError> {
        match payload.get("data") {
            Some(Json::Object(fields)) => Ok(Self::new(fields.clone())),
            _ => Err(MappingError::MissingData),
        }
    }

    /// The instance identifier recorded by the collecting device.
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.fields
            .get("meta")
            .and_then(|m| m.get("instanceID"))
            .and_then(Json::as_str)
    }

    /// Read a scalar field.
    ///
    /// Missing and `null` fields are [`Value::Absent`]; strings, numbers and
    /// booleans are rendered as text.
    pub fn field(&self, name: &str) -> Result<Value, MappingError> {
        match self.fields.get(name) {
            None | Some(Json::Null) => Ok(Value::Absent),
            Some(Json::String(s)) => Ok(Value::Text(s.clone())),
            Some(Json::Number(n)) => Ok(Value::Text(n.to_string())),
            Some(Json::Bool(b)) => Ok(Value::Text(b.to_string())),
            Some(other) => Err(MappingError::UnexpectedType {
                field: name.to_string(),
                expected: "scalar",
                found: json_type(other),
            }),
        }
    }

    /// Read a field that must be a string when present.
    pub fn text(&self, name: &str) -> Result<Option<&str>, MappingError> {
        match self.fields.get(name) {
            None | Some(Json::Null) => Ok(None),
            Some(Json::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(MappingError::UnexpectedType {
                field: name.to_string(),
                expected: "string",
                found: json_type(other),
            }),
        }
    }

    pub fn fields(&self) -> &Map<String, Json> {
        &self.fields
    }
}

pub(crate) fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
