use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::events::HandlerError;

/// A decoded journal record: the event kind plus whatever else the line carried.
///
/// No schema is enforced here. Handlers pull the fields they need through the
/// typed accessors below, each of which takes a list of accepted key aliases
/// (the journal's CamelCase name first, then any shorthand).
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub kind: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub fields: Map<String, Value>,
}

impl RawEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            timestamp: None,
            fields: Map::new(),
        }
    }

    /// Builder used mostly by tests.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// First present value among `keys`.
    pub fn field(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.fields.get(*k))
    }

    pub fn str_field(&self, keys: &[&str]) -> Option<&str> {
        self.field(keys).and_then(Value::as_str)
    }

    pub fn u64_field(&self, keys: &[&str]) -> Option<u64> {
        self.field(keys).and_then(Value::as_u64)
    }

    pub fn f64_field(&self, keys: &[&str]) -> Option<f64> {
        self.field(keys).and_then(Value::as_f64)
    }

    pub fn array_field(&self, keys: &[&str]) -> Option<&Vec<Value>> {
        self.field(keys).and_then(Value::as_array)
    }

    pub fn datetime_field(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        self.str_field(keys).and_then(parse_timestamp)
    }

    /// Ids arrive as JSON numbers in real journals and as strings in hand-written ones.
    pub fn id_field(&self, keys: &[&str]) -> Option<String> {
        self.field(keys).and_then(value_as_id)
    }

    pub fn require_str(&self, keys: &[&str]) -> Result<&str, HandlerError> {
        let value = self.require_present(keys)?;
        value
            .as_str()
            .ok_or_else(|| self.invalid(keys, "expected a string"))
    }

    pub fn require_u64(&self, keys: &[&str]) -> Result<u64, HandlerError> {
        let value = self.require_present(keys)?;
        value
            .as_u64()
            .ok_or_else(|| self.invalid(keys, "expected a non-negative integer"))
    }

    pub fn require_id(&self, keys: &[&str]) -> Result<String, HandlerError> {
        let value = self.require_present(keys)?;
        value_as_id(value).ok_or_else(|| self.invalid(keys, "expected a string or integer id"))
    }

    pub fn require_array(&self, keys: &[&str]) -> Result<&Vec<Value>, HandlerError> {
        let value = self.require_present(keys)?;
        value
            .as_array()
            .ok_or_else(|| self.invalid(keys, "expected an array"))
    }

    /// Absent is fine; present with the wrong type is not.
    pub fn optional_u64(&self, keys: &[&str]) -> Result<Option<u64>, HandlerError> {
        match self.field(keys) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.invalid(keys, "expected a non-negative integer")),
        }
    }

    pub fn optional_f64(&self, keys: &[&str]) -> Result<Option<f64>, HandlerError> {
        match self.field(keys) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(keys, "expected a number")),
        }
    }

    pub(crate) fn invalid_field(&self, keys: &[&str], reason: &str) -> HandlerError {
        self.invalid(keys, reason)
    }

    fn require_present(&self, keys: &[&str]) -> Result<&Value, HandlerError> {
        self.field(keys).ok_or_else(|| HandlerError::MissingField {
            kind: self.kind.clone(),
            field: primary_key(keys),
        })
    }

    fn invalid(&self, keys: &[&str], reason: &str) -> HandlerError {
        HandlerError::InvalidField {
            kind: self.kind.clone(),
            field: primary_key(keys),
            reason: reason.to_string(),
        }
    }
}

fn primary_key(keys: &[&str]) -> String {
    keys.first().copied().unwrap_or_default().to_string()
}

pub(crate) fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
