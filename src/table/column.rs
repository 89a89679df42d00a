//! Column descriptor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{ColumnType, Literal};
use super::{Options, check_keys, expect_bool, expect_opt_string, expect_opt_u32};
use crate::config::ColumnDefaults;
use crate::error::{ShiftError, ShiftResult};

const COLUMN_OPTIONS: &[&str] = &[
    "null",
    "default",
    "limit",
    "length",
    "precision",
    "scale",
    "signed",
    "identity",
    "comment",
    "after",
    "collation",
];

/// Column default: raw SQL (`CURRENT_TIMESTAMP`) or a plain value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Literal(Literal),
    Value(Value),
}

impl From<Literal> for DefaultValue {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Value(Value::from(value))
    }
}

/// A column definition.
///
/// The type is optional: `RemoveColumn` and `RenameColumn` only know the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Column {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
    #[serde(default = "default_true")]
    pub null: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default = "default_true")]
    pub signed: bool,
    #[serde(default)]
    pub identity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Column {
    /// Create a nullable column of the given type.
    pub fn new(name: impl Into<String>, column_type: impl Into<ColumnType>) -> Self {
        Self::with_defaults(name, column_type, &ColumnDefaults::default())
    }

    /// Create a column whose nullability follows `defaults`.
    pub fn with_defaults(
        name: impl Into<String>,
        column_type: impl Into<ColumnType>,
        defaults: &ColumnDefaults,
    ) -> Self {
        let mut column = Self::named(name);
        column.column_type = Some(column_type.into());
        column.null = defaults.null;
        column
    }

    /// A name-only column, used when the definition is irrelevant.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: None,
            null: true,
            default: None,
            limit: None,
            precision: None,
            scale: None,
            signed: true,
            identity: false,
            comment: None,
            after: None,
            collation: None,
        }
    }

    /// Build a column from primitive parts, validating `options`.
    pub fn build(
        name: impl Into<String>,
        column_type: impl Into<ColumnType>,
        options: &Options,
        defaults: &ColumnDefaults,
    ) -> ShiftResult<Self> {
        let mut column = Self::with_defaults(name, column_type, defaults);
        column.set_options(options)?;
        Ok(column)
    }

    /// Apply an option map.
    ///
    /// Unknown keys fail before anything is changed. `identity: true` always
    /// wins over `null`, whatever the key order.
    pub fn set_options(&mut self, options: &Options) -> ShiftResult<()> {
        check_keys("column", options, COLUMN_OPTIONS)?;

        let mut identity = None;
        for (key, value) in options {
            match key.as_str() {
                "null" => self.null = expect_bool("column", key, value)?,
                "default" => {
                    self.default = match value {
                        Value::Null => None,
                        other => Some(serde_json::from_value(other.clone())?),
                    }
                }
                "limit" | "length" => self.limit = expect_opt_u32("column", key, value)?,
                "precision" => self.precision = expect_opt_u32("column", key, value)?,
                "scale" => self.scale = expect_opt_u32("column", key, value)?,
                "signed" => self.signed = expect_bool("column", key, value)?,
                "identity" => identity = Some(expect_bool("column", key, value)?),
                "comment" => self.comment = expect_opt_string("column", key, value)?,
                "after" => self.after = expect_opt_string("column", key, value)?,
                "collation" => self.collation = expect_opt_string("column", key, value)?,
                other => return Err(ShiftError::invalid_option("column", other)),
            }
        }

        if let Some(identity) = identity {
            self.identity = identity;
            if identity {
                self.null = false;
            }
        }
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn not_null(mut self) -> Self {
        self.null = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    /// Auto-increment; implies NOT NULL.
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self.null = false;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Positional hint: place this column after `column`.
    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after = Some(column.into());
        self
    }

    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// Every attribute except the name, keyed by option name.
    ///
    /// Unset optional attributes are absent from the map.
    pub fn attributes(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                map.remove("name");
                map
            }
            _ => Map::new(),
        }
    }
}
