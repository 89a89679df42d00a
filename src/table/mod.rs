//! Identity value types
//!
//! Descriptors for the schema entities that actions point at: tables,
//! columns, indexes and foreign keys. Option maps are validated when they are
//! applied, so a malformed descriptor never makes it into an action.

pub mod column;
pub mod foreign_key;
pub mod index;
pub mod types;

pub use column::{Column, DefaultValue};
pub use foreign_key::{FkAction, ForeignKey};
pub use index::{Index, IndexTarget, IndexType};
pub use types::{ColumnType, Literal};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ShiftError, ShiftResult};

/// Option map accepted by the `set_options` methods.
pub type Options = Map<String, Value>;

const TABLE_OPTIONS: &[&str] = &["id", "primary_key", "collation", "comment", "signed"];

/// A table reference.
///
/// Actions only ever read it; renaming a table produces a new `Table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Table {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, skip_serializing_if = "TableOptions::is_default")]
    pub options: TableOptions,
}

/// Creation options for a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableOptions {
    /// Add the automatic `id` primary key column.
    pub id: bool,
    /// Explicit primary key columns.
    pub primary_key: Vec<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    /// Signedness of the automatic `id` column.
    pub signed: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            id: true,
            primary_key: Vec::new(),
            collation: None,
            comment: None,
            signed: true,
        }
    }
}

impl TableOptions {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            catalog: None,
            options: TableOptions::default(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn in_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply an option map; fails before changing anything if a key is unknown.
    pub fn set_options(&mut self, options: &Options) -> ShiftResult<()> {
        check_keys("table", options, TABLE_OPTIONS)?;
        for (key, value) in options {
            match key.as_str() {
                "id" => self.options.id = expect_bool("table", key, value)?,
                "primary_key" => self.options.primary_key = expect_string_list("table", key, value)?,
                "collation" => self.options.collation = expect_opt_string("table", key, value)?,
                "comment" => self.options.comment = expect_opt_string("table", key, value)?,
                "signed" => self.options.signed = expect_bool("table", key, value)?,
                other => return Err(ShiftError::invalid_option("table", other)),
            }
        }
        Ok(())
    }

    /// `catalog.schema.name`, skipping absent qualifiers.
    pub fn qualified_name(&self) -> String {
        [self.catalog.as_deref(), self.schema.as_deref(), Some(self.name.as_str())]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl From<&str> for Table {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Table {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Ordered column names; a single name becomes a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnList(Vec<String>);

impl ColumnList {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for ColumnList {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for ColumnList {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for ColumnList {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for ColumnList {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for ColumnList {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ColumnList {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|s| s.to_string()).collect())
    }
}

pub(crate) fn check_keys(kind: &'static str, options: &Options, allowed: &[&str]) -> ShiftResult<()> {
    match options.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(ShiftError::invalid_option(kind, key.as_str())),
        None => Ok(()),
    }
}

pub(crate) fn expect_bool(kind: &'static str, key: &str, value: &Value) -> ShiftResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| ShiftError::invalid_value(kind, key, format!("expected a boolean, got {}", value)))
}

pub(crate) fn expect_opt_u32(kind: &'static str, key: &str, value: &Value) -> ShiftResult<Option<u32>> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| {
            ShiftError::invalid_value(kind, key, format!("expected a non-negative integer, got {}", value))
        })
}

pub(crate) fn expect_opt_string(
    kind: &'static str,
    key: &str,
    value: &Value,
) -> ShiftResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(ShiftError::invalid_value(
            kind,
            key,
            format!("expected a string, got {}", other),
        )),
    }
}

/// Accepts a single string or an array of strings.
pub(crate) fn expect_string_list(
    kind: &'static str,
    key: &str,
    value: &Value,
) -> ShiftResult<Vec<String>> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ShiftError::invalid_value(kind, key, format!("expected a string, got {}", item))
                })
            })
            .collect(),
        other => Err(ShiftError::invalid_value(
            kind,
            key,
            format!("expected a string or list of strings, got {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Options {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(Table::new("users").qualified_name(), "users");
        assert_eq!(
            Table::new("users").in_schema("public").qualified_name(),
            "public.users"
        );
        assert_eq!(
            Table::new("users")
                .in_schema("public")
                .in_catalog("main")
                .qualified_name(),
            "main.public.users"
        );
    }

    #[test]
    fn test_table_set_options() {
        let mut table = Table::new("articles");
        table
            .set_options(&options(json!({
                "id": false,
                "primary_key": ["site_id", "slug"],
                "collation": "utf8mb4_unicode_ci",
            })))
            .unwrap();

        assert!(!table.options.id);
        assert_eq!(table.options.primary_key, vec!["site_id", "slug"]);
        assert_eq!(table.options.collation.as_deref(), Some("utf8mb4_unicode_ci"));
    }

    #[test]
    fn test_table_rejects_unknown_option() {
        let mut table = Table::new("articles");
        let err = table
            .set_options(&options(json!({ "comment": "x", "engine": "InnoDB" })))
            .unwrap_err();
        assert_eq!(err.to_string(), "\"engine\" is not a valid table option.");
        // nothing applied
        assert_eq!(table.options.comment, None);
    }

    #[test]
    fn test_column_list_normalization() {
        assert_eq!(ColumnList::from("id").into_vec(), vec!["id"]);
        assert_eq!(ColumnList::from(["a", "b"]).into_vec(), vec!["a", "b"]);
        assert_eq!(
            ColumnList::from(vec!["x".to_string()]).as_slice(),
            &["x".to_string()]
        );
    }
}
