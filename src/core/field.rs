//! Field value types and field declarations

use crate::core::error::QueryError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// A polymorphic field value that can hold different types
///
/// A missing field and [`FieldValue::Null`] are treated the same by every
/// engine in the crate.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Number(f64),
    Date(DateTime<Utc>),
    Boolean(bool),
    Enum(String),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible (strings and enum variants)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) | FieldValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a number if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the value as a date if possible
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Get the value as a boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Declared type of the value, `None` for null
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            FieldValue::String(_) => Some(ValueType::String),
            FieldValue::Number(_) => Some(ValueType::Number),
            FieldValue::Date(_) => Some(ValueType::Date),
            FieldValue::Boolean(_) => Some(ValueType::Boolean),
            FieldValue::Enum(_) => Some(ValueType::Enum),
            FieldValue::Null => None,
        }
    }

    /// Short description used in type mismatch errors
    pub fn describe(&self) -> String {
        match self {
            FieldValue::Null => "null".to_string(),
            other => format!(
                "{} \"{}\"",
                other.value_type().map(|t| t.to_string()).unwrap_or_default(),
                other
            ),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) | FieldValue::Enum(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Null => Ok(()),
        }
    }
}

/// Plain data formats carry no date or enum tag: strings stay strings until a
/// [`FieldSpec`] interprets them.
impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Boolean(bool),
            Number(f64),
            String(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Boolean(b)) => FieldValue::Boolean(b),
            Some(Raw::Number(n)) => FieldValue::Number(n),
            Some(Raw::String(s)) => FieldValue::String(s),
            None => FieldValue::Null,
        })
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(f64::from(n))
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Number(f64::from(n))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(d: DateTime<Utc>) -> Self {
        FieldValue::Date(d)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Date,
    Boolean,
    Enum,
}

impl ValueType {
    /// Whether a comparison mode can be applied to values of this type
    pub fn supports(&self, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Equals => true,
            MatchMode::Contains => matches!(self, ValueType::String | ValueType::Enum),
            MatchMode::Range => matches!(self, ValueType::Number | ValueType::Date),
            MatchMode::OneOf => !matches!(self, ValueType::Date),
        }
    }

    /// Mode used for plain text input when a field declares none
    pub fn default_mode(&self) -> MatchMode {
        match self {
            ValueType::String => MatchMode::Contains,
            ValueType::Number | ValueType::Date => MatchMode::Range,
            ValueType::Boolean | ValueType::Enum => MatchMode::Equals,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Date => "date",
            ValueType::Boolean => "boolean",
            ValueType::Enum => "enum",
        };
        f.write_str(name)
    }
}

/// Comparison mode of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-insensitive substring match
    Contains,
    /// Exact match against one canonical value
    Equals,
    /// Inclusive lower/upper bounds
    Range,
    /// Membership in a set of values
    OneOf,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchMode::Contains => "contains",
            MatchMode::Equals => "equals",
            MatchMode::Range => "range",
            MatchMode::OneOf => "one_of",
        };
        f.write_str(name)
    }
}

/// Declared metadata for one filterable and sortable field
///
/// # Example
/// ```yaml
/// - name: status
///   type: enum
///   mode: equals
///   variants: [Active, Expired]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as found on records
    pub name: String,

    /// Declared value type
    #[serde(rename = "type")]
    pub value_type: ValueType,

    /// Mode applied to plain text input, defaults per type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<MatchMode>,

    /// Column label for the presentation layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Allowed variants for enum fields, in display and sort order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            mode: None,
            label: None,
            variants: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Number)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Date)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Boolean)
    }

    pub fn enumeration<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variants: variants.into_iter().map(Into::into).collect(),
            ..Self::new(name, ValueType::Enum)
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Mode applied to plain text input
    pub fn text_mode(&self) -> MatchMode {
        self.mode.unwrap_or_else(|| self.value_type.default_mode())
    }

    /// Ensure a comparison mode can be used on this field
    pub fn require_mode(&self, mode: MatchMode) -> Result<(), QueryError> {
        if self.value_type.supports(mode) {
            Ok(())
        } else {
            Err(QueryError::UnsupportedMode {
                field: self.name.clone(),
                mode,
                value_type: self.value_type,
            })
        }
    }

    /// Check a typed value against the declared type
    ///
    /// Strings are accepted for enum fields and normalized to the canonical
    /// variant. Null is always accepted.
    pub fn accept(&self, value: FieldValue) -> Result<FieldValue, QueryError> {
        match (self.value_type, value) {
            (_, FieldValue::Null) => Ok(FieldValue::Null),
            (ValueType::String, v @ FieldValue::String(_)) => Ok(v),
            (ValueType::Number, v @ FieldValue::Number(_)) => Ok(v),
            (ValueType::Date, v @ FieldValue::Date(_)) => Ok(v),
            (ValueType::Boolean, v @ FieldValue::Boolean(_)) => Ok(v),
            (ValueType::Enum, FieldValue::Enum(s) | FieldValue::String(s)) => self.variant(&s),
            (_, other) => Err(self.mismatch(&other.describe())),
        }
    }

    /// Parse user text into a typed value for this field
    pub fn parse_text(&self, text: &str) -> Result<FieldValue, QueryError> {
        let text = text.trim();
        match self.value_type {
            ValueType::String => Ok(FieldValue::String(text.to_string())),
            ValueType::Enum => self.variant(text),
            ValueType::Number => text
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FieldValue::Number)
                .ok_or_else(|| self.mismatch(&format!("string \"{}\"", text))),
            ValueType::Date => parse_date(text)
                .map(FieldValue::Date)
                .ok_or_else(|| self.mismatch(&format!("string \"{}\"", text))),
            ValueType::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "no" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(self.mismatch(&format!("string \"{}\"", text))),
            },
        }
    }

    /// Convert a raw JSON value from a record source
    pub fn from_json(&self, raw: &Value) -> Result<FieldValue, QueryError> {
        match raw {
            Value::Null => Ok(FieldValue::Null),
            Value::String(s) => match self.value_type {
                ValueType::String => Ok(FieldValue::String(s.clone())),
                _ => self.parse_text(s),
            },
            Value::Number(n) => match (self.value_type, n.as_f64()) {
                (ValueType::Number, Some(n)) => Ok(FieldValue::Number(n)),
                (ValueType::Date, Some(ms)) => DateTime::from_timestamp_millis(ms as i64)
                    .map(FieldValue::Date)
                    .ok_or_else(|| self.mismatch(&format!("number \"{}\"", n))),
                _ => Err(self.mismatch(&format!("number \"{}\"", n))),
            },
            Value::Bool(b) => self.accept(FieldValue::Boolean(*b)),
            Value::Array(_) => Err(self.mismatch("array")),
            Value::Object(_) => Err(self.mismatch("object")),
        }
    }

    fn variant(&self, text: &str) -> Result<FieldValue, QueryError> {
        if self.variants.is_empty() {
            return Ok(FieldValue::Enum(text.to_string()));
        }
        self.variants
            .iter()
            .find(|v| v.eq_ignore_ascii_case(text))
            .map(|v| FieldValue::Enum(v.clone()))
            .ok_or_else(|| QueryError::InvalidVariant {
                field: self.name.clone(),
                value: text.to_string(),
                allowed: self.variants.clone(),
            })
    }

    fn mismatch(&self, found: &str) -> QueryError {
        QueryError::TypeMismatch {
            field: self.name.clone(),
            expected: self.value_type,
            found: found.to_string(),
        }
    }
}

/// Parse a date as RFC 3339, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD` (UTC)
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
