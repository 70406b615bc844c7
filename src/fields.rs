//! Configuration field declarations.
//!
//! Describes the keys this crate reads, grouped into named field sets, with
//! their type, default, allowed values and a description. The descriptors are
//! pure data; the `config` crate resolves the actual values, and these sets
//! only feed it defaults and check enumerations afterwards.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

use crate::error::{LogError, LogResult};

/// Field-set key for logging configuration fields.
pub const LOG_FIELD_SET_KEY: &str = "log";
pub const LOG_COLOR_KEY: &str = "color";
pub const LOG_CONFIG_KEY: &str = "config";
pub const LOG_FORMAT_KEY: &str = "format";
pub const LOG_LEVEL_KEY: &str = "level";

/// Field-set key for application identity fields.
pub const APP_FIELD_SET_KEY: &str = "app";
pub const APP_ID_KEY: &str = "id";

/// Value type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    String,
}

/// A declared default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Bool(bool),
    String(String),
}

impl FieldValue {
    /// Type this value satisfies.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::String(_) => FieldType::String,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

/// A single configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: &'static str,
    pub field_type: FieldType,
    pub default: Option<FieldValue>,
    /// Allowed values; empty means unrestricted.
    pub enumeration: Vec<&'static str>,
    pub description: &'static str,
}

impl Field {
    /// Start declaring field `key` of type `field_type`.
    pub fn builder(key: &'static str, field_type: FieldType) -> FieldBuilder {
        FieldBuilder {
            field: Field {
                key,
                field_type,
                default: None,
                enumeration: Vec::new(),
                description: "",
            },
        }
    }

    /// Whether `value` is acceptable for this field.
    pub fn allows(&self, value: &str) -> bool {
        self.enumeration.is_empty() || self.enumeration.contains(&value)
    }
}

/// Builder for [`Field`].
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Value used when no source sets the field.
    pub fn default(mut self, value: impl Into<FieldValue>) -> Self {
        self.field.default = Some(value.into());
        self
    }

    /// Restrict non-empty values to `values`.
    pub fn enumeration(mut self, values: &[&'static str]) -> Self {
        self.field.enumeration = values.to_vec();
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.field.description = description;
        self
    }

    pub fn build(self) -> Field {
        self.field
    }
}

/// A named group of fields, addressed as `<set>.<field>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    pub key: &'static str,
    pub fields: Vec<Field>,
}

impl FieldSet {
    /// Start declaring the set addressed by `key`.
    pub fn builder(key: &'static str) -> FieldSetBuilder {
        FieldSetBuilder {
            set: FieldSet {
                key,
                fields: Vec::new(),
            },
        }
    }

    /// Look up a field by its key within this set.
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Dotted key for a field of this set, e.g. `log.level`.
    pub fn full_key(&self, field: &Field) -> String {
        format!("{}.{}", self.key, field.key)
    }

    /// Register every declared default with a `config` builder.
    pub fn apply_defaults(
        &self,
        mut builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        for field in &self.fields {
            let key = self.full_key(field);
            builder = match &field.default {
                Some(FieldValue::Bool(value)) => builder.set_default(key, *value)?,
                Some(FieldValue::String(value)) => builder.set_default(key, value.as_str())?,
                None => builder,
            };
        }
        Ok(builder)
    }

    /// Check resolved values against the declared enumerations.
    ///
    /// Missing and empty values are accepted; they mean "unset".
    pub fn check(&self, resolved: &config::Config) -> LogResult<()> {
        for field in &self.fields {
            let key = self.full_key(field);
            match field.field_type {
                FieldType::Bool => match resolved.get_bool(&key) {
                    Ok(_) | Err(ConfigError::NotFound(_)) => {}
                    Err(err) => return Err(err.into()),
                },
                FieldType::String => {
                    let value = match resolved.get_string(&key) {
                        Ok(value) => value,
                        Err(ConfigError::NotFound(_)) => continue,
                        Err(err) => return Err(err.into()),
                    };
                    if !value.is_empty() && !field.allows(&value) {
                        return Err(LogError::InvalidField {
                            key,
                            value,
                            allowed: field.enumeration.iter().map(|v| v.to_string()).collect(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Builder for [`FieldSet`].
#[derive(Debug)]
pub struct FieldSetBuilder {
    set: FieldSet,
}

impl FieldSetBuilder {
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.set.fields.extend(fields);
        self
    }

    pub fn build(self) -> FieldSet {
        self.set
    }
}

/// Ordered collection of field sets.
pub type FieldSets = Vec<FieldSet>;

/// Fields for an application logger.
pub fn logger_field_set() -> FieldSet {
    FieldSet::builder(LOG_FIELD_SET_KEY)
        .fields([
            Field::builder(LOG_COLOR_KEY, FieldType::Bool)
                .default(true)
                .description("Colorize level names; only applies to the console format")
                .build(),
            Field::builder(LOG_CONFIG_KEY, FieldType::String)
                .default("production")
                .enumeration(&["production", "development"])
                .description("Base preset for the logger (production: info + json, development: debug + console)")
                .build(),
            Field::builder(LOG_FORMAT_KEY, FieldType::String)
                .default("json")
                .enumeration(&["console", "json"])
                .description("Output encoding, overriding the preset")
                .build(),
            Field::builder(LOG_LEVEL_KEY, FieldType::String)
                .default("info")
                .enumeration(&["debug", "info", "warn", "error", "dpanic", "panic", "fatal"])
                .description("Minimum severity, overriding the preset")
                .build(),
        ])
        .build()
}

/// Field sets for an application logger.
pub fn logger_field_sets() -> FieldSets {
    vec![logger_field_set()]
}

/// Identity fields for the application emitting logs.
pub fn app_field_set() -> FieldSet {
    FieldSet::builder(APP_FIELD_SET_KEY)
        .fields([Field::builder(APP_ID_KEY, FieldType::String)
            .description("Identifier attached to every log entry as `id`")
            .build()])
        .build()
}
