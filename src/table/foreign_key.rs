//! Foreign key descriptor.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ColumnList, Options, Table, check_keys, expect_opt_string};
use crate::error::{ShiftError, ShiftResult};

const FOREIGN_KEY_OPTIONS: &[&str] = &["update", "delete", "constraint"];

/// Referential action for ON UPDATE / ON DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FkAction {
    Cascade,
    Restrict,
    SetNull,
    NoAction,
    SetDefault,
}

impl FkAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
            Self::NoAction => "NO ACTION",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for FkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Accepts `SET_NULL`, `set null`, `Set Null`, ...
impl std::str::FromStr for FkAction {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(' ', "_").as_str() {
            "CASCADE" => Ok(Self::Cascade),
            "RESTRICT" => Ok(Self::Restrict),
            "SET_NULL" => Ok(Self::SetNull),
            "NO_ACTION" => Ok(Self::NoAction),
            "SET_DEFAULT" => Ok(Self::SetDefault),
            _ => Err(ShiftError::invalid_value(
                "foreign key",
                "action",
                format!("unknown referential action '{}'", s),
            )),
        }
    }
}

/// A foreign key constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKey {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_table: Option<Table>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<FkAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<FkAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

impl ForeignKey {
    pub fn new(columns: impl Into<ColumnList>) -> Self {
        Self {
            columns: columns.into().into_vec(),
            ..Self::default()
        }
    }

    pub fn references(mut self, table: impl Into<Table>, columns: impl Into<ColumnList>) -> Self {
        self.referenced_table = Some(table.into());
        self.referenced_columns = columns.into().into_vec();
        self
    }

    pub fn on_update(mut self, action: FkAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub fn on_delete(mut self, action: FkAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn constraint(mut self, name: impl Into<String>) -> Self {
        self.constraint = Some(name.into());
        self
    }

    /// Apply an option map; fails before changing anything if a key is unknown.
    pub fn set_options(&mut self, options: &Options) -> ShiftResult<()> {
        check_keys("foreign key", options, FOREIGN_KEY_OPTIONS)?;
        for (key, value) in options {
            let text = expect_opt_string("foreign key", key, value)?;
            match key.as_str() {
                "update" => self.on_update = text.map(|s| s.parse()).transpose()?,
                "delete" => self.on_delete = text.map(|s| s.parse()).transpose()?,
                "constraint" => self.constraint = text,
                other => return Err(ShiftError::invalid_option("foreign key", other)),
            }
        }
        Ok(())
    }

    /// Local and referenced column lists must line up one to one.
    ///
    /// A key without referenced columns (e.g. one being dropped by its local
    /// columns) is not checked.
    pub fn validate(&self) -> ShiftResult<()> {
        if !self.referenced_columns.is_empty()
            && self.referenced_columns.len() != self.columns.len()
        {
            return Err(ShiftError::ForeignKeyArity {
                local: self.columns.len(),
                referenced: self.referenced_columns.len(),
            });
        }
        Ok(())
    }
}
