//! Records displayed by a list view

use crate::core::field::FieldValue;
use indexmap::IndexMap;
use serde::Serialize;

/// One item in a displayed collection (a course, grade, quiz, notification...)
///
/// The engines treat a record as a mapping from field name to scalar value
/// plus a stable unique key. Field order is kept as inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    key: String,
    #[serde(flatten)]
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record with the given key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get a field value, treating null as missing
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn fields_mut(&mut self) -> impl Iterator<Item = (&String, &mut FieldValue)> {
        self.fields.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_get() {
        let record = Record::new("g-1")
            .with("name", "A")
            .with("grade", 85)
            .with("comment", Option::<String>::None);

        assert_eq!(record.key(), "g-1");
        assert_eq!(record.get("name"), Some(&FieldValue::from("A")));
        assert_eq!(record.get("grade").and_then(FieldValue::as_number), Some(85.0));
        assert_eq!(record.get("comment"), None);
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_set_replaces_value() {
        let mut record = Record::new("c-1").with("title", "Python 101");
        record.set("title", "Python 201");
        assert_eq!(record.get("title").and_then(FieldValue::as_str), Some("Python 201"));
        assert_eq!(record.fields().count(), 1);
    }

    #[test]
    fn test_serialize_flattens_fields() {
        let record = Record::new("q-7").with("title", "Quiz 1").with("score", 9);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"key": "q-7", "title": "Quiz 1", "score": 9.0})
        );
    }
}
