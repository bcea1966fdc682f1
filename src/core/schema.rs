//! Field schema of a view

use crate::core::error::QueryError;
use crate::core::field::{FieldSpec, FieldValue};
use crate::core::record::Record;
use indexmap::IndexMap;
use serde_json::Value;
use uuid::Uuid;

/// Ordered set of field declarations plus the name of the key field
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    key_field: String,
    fields: IndexMap<String, FieldSpec>,
}

impl Schema {
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field declaration; a later declaration replaces an earlier one
    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        self.insert(spec);
        self
    }

    pub fn insert(&mut self, spec: FieldSpec) {
        self.fields.insert(spec.name.clone(), spec);
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Look up a field declaration
    pub fn field(&self, name: &str) -> Result<&FieldSpec, QueryError> {
        self.fields.get(name).ok_or_else(|| QueryError::UnknownField {
            field: name.to_string(),
        })
    }

    /// Check every declared field of a record against its type
    ///
    /// Enum strings are normalized to their canonical variant. Undeclared
    /// fields are carried through untouched.
    pub fn conform(&self, mut record: Record) -> Result<Record, QueryError> {
        for (name, value) in record.fields_mut() {
            if let Some(spec) = self.fields.get(name) {
                let current = std::mem::replace(value, FieldValue::Null);
                *value = spec.accept(current)?;
            }
        }
        Ok(record)
    }

    /// Build a record from a JSON object returned by a record source
    ///
    /// The key is read from the key field (string or number). A record with
    /// no key gets a generated one.
    pub fn record_from_json(&self, raw: &Value) -> Result<Record, QueryError> {
        let object = raw.as_object().ok_or_else(|| QueryError::TypeMismatch {
            field: self.key_field.clone(),
            expected: crate::core::field::ValueType::String,
            found: json_kind(raw).to_string(),
        })?;

        let key = match object.get(&self.key_field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        let mut record = Record::new(key);
        for (name, value) in object {
            if name == &self.key_field {
                continue;
            }
            if let Some(spec) = self.fields.get(name) {
                record.set(name.clone(), spec.from_json(value)?);
            }
        }
        Ok(record)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
