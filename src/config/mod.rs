//! View configuration loading and validation

use crate::core::aggregate::AggregateSpec;
use crate::core::derive::DerivedField;
use crate::core::error::ConfigError;
use crate::core::field::{FieldSpec, MatchMode, ValueType};
use crate::core::predicate::{QueryValue, build_predicate};
use crate::core::query::clamp_page_size;
use crate::core::schema::Schema;
use crate::core::sort::{SortDirection, SortSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default sort of a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: String,

    #[serde(default)]
    pub direction: SortDirection,
}

/// Kind of a configured statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Average,
    Sum,
    Min,
    Max,
    Percentage,
    GroupCounts,
}

/// One statistic shown next to the list
///
/// `percentage` needs a `label` and a `value` the field must match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub kind: AggregateKind,
    pub field: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<QueryValue>,
}

/// Complete configuration of one list view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// View name, used in logs
    pub name: String,

    /// Field holding the record key
    #[serde(default = "default_key_field")]
    pub key_field: String,

    /// Declared fields
    pub fields: Vec<FieldSpec>,

    /// Fields matched by the search box
    #[serde(default)]
    pub search_fields: Vec<String>,

    /// Sort applied on mount and on reset
    #[serde(default)]
    pub default_sort: Option<SortConfig>,

    /// Records per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Fields computed when records are loaded
    #[serde(default)]
    pub derived: Vec<DerivedField>,

    /// Statistics computed over the filtered records
    #[serde(default)]
    pub aggregates: Vec<AggregateConfig>,
}

fn default_key_field() -> String {
    "id".to_string()
}

fn default_page_size() -> usize {
    10
}

impl ViewConfig {
    /// Create an empty configuration with defaults
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_field: default_key_field(),
            fields: Vec::new(),
            search_fields: Vec::new(),
            default_sort: None,
            page_size: default_page_size(),
            derived: Vec::new(),
            aggregates: Vec::new(),
        }
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            file: None,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Records per page, clamped to the accepted range
    pub fn page_size(&self) -> usize {
        clamp_page_size(self.page_size)
    }

    /// Check that every reference points to a declared field of the right type
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    field: field.name.clone(),
                });
            }
            if let Some(mode) = field.mode {
                field.require_mode(mode).map_err(|e| invalid(&field.name, e))?;
            }
        }

        for derived in &self.derived {
            let source = self
                .fields
                .iter()
                .find(|f| f.name == derived.source())
                .ok_or_else(|| unknown(derived.source(), "derived fields"))?;
            if let Some(expected) = derived.source_type() {
                if source.value_type != expected {
                    return Err(ConfigError::InvalidValue {
                        field: derived.target().to_string(),
                        message: format!(
                            "source '{}' must be a {} field, found {}",
                            source.name, expected, source.value_type
                        ),
                    });
                }
            }
            if !seen.insert(derived.target()) {
                return Err(ConfigError::DuplicateField {
                    field: derived.target().to_string(),
                });
            }
        }

        let schema = self.schema();
        for name in &self.search_fields {
            let spec = schema
                .field(name)
                .map_err(|_| unknown(name, "search_fields"))?;
            spec.require_mode(MatchMode::Contains)
                .map_err(|e| invalid(name, e))?;
        }

        if let Some(sort) = &self.default_sort {
            schema
                .field(&sort.field)
                .map_err(|_| unknown(&sort.field, "default_sort"))?;
        }

        self.aggregate_specs(&schema).map(|_| ())
    }

    /// Schema of declared fields plus derived targets
    pub fn schema(&self) -> Schema {
        let mut schema = Schema::new(self.key_field.clone());
        for field in &self.fields {
            schema.insert(field.clone());
        }
        for derived in &self.derived {
            schema.insert(derived.spec());
        }
        schema
    }

    /// Declarations of the search fields
    pub fn search_specs(&self, schema: &Schema) -> Result<Vec<FieldSpec>, ConfigError> {
        self.search_fields
            .iter()
            .map(|name| {
                schema
                    .field(name)
                    .cloned()
                    .map_err(|_| unknown(name, "search_fields"))
            })
            .collect()
    }

    /// Default sort resolved against the schema
    pub fn default_sort_spec(&self, schema: &Schema) -> Result<Option<SortSpec>, ConfigError> {
        self.default_sort
            .as_ref()
            .map(|sort| {
                schema
                    .field(&sort.field)
                    .map(|spec| SortSpec {
                        field: spec.clone(),
                        direction: sort.direction,
                    })
                    .map_err(|_| unknown(&sort.field, "default_sort"))
            })
            .transpose()
    }

    /// Statistics resolved against the schema
    pub fn aggregate_specs(&self, schema: &Schema) -> Result<Vec<AggregateSpec>, ConfigError> {
        self.aggregates
            .iter()
            .map(|agg| {
                let spec = schema
                    .field(&agg.field)
                    .map_err(|_| unknown(&agg.field, "aggregates"))?;
                let numeric = || {
                    if spec.value_type == ValueType::Number {
                        Ok(())
                    } else {
                        Err(ConfigError::InvalidValue {
                            field: agg.field.clone(),
                            message: format!("{:?} needs a number field", agg.kind),
                        })
                    }
                };
                Ok(match agg.kind {
                    AggregateKind::Average => {
                        numeric().map(|_| AggregateSpec::average(&agg.field))?
                    }
                    AggregateKind::Sum => numeric().map(|_| AggregateSpec::sum(&agg.field))?,
                    AggregateKind::Min => numeric().map(|_| AggregateSpec::min(&agg.field))?,
                    AggregateKind::Max => numeric().map(|_| AggregateSpec::max(&agg.field))?,
                    AggregateKind::GroupCounts => AggregateSpec::group_counts(&agg.field),
                    AggregateKind::Percentage => {
                        let value = agg.value.as_ref().ok_or_else(|| ConfigError::InvalidValue {
                            field: agg.field.clone(),
                            message: "percentage needs a value to match".to_string(),
                        })?;
                        let predicate =
                            build_predicate(spec, value).map_err(|e| invalid(&agg.field, e))?;
                        let label = agg.label.clone().unwrap_or_else(|| agg.field.clone());
                        AggregateSpec::percentage(label, predicate)
                    }
                })
            })
            .collect()
    }
}

fn unknown(field: &str, context: &str) -> ConfigError {
    ConfigError::UnknownField {
        field: field.to_string(),
        context: context.to_string(),
    }
}

fn invalid(field: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: err.to_string(),
    }
}
