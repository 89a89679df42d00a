//! Index descriptor.

use serde::{Deserialize, Serialize};

use super::{ColumnList, Options, check_keys, expect_bool, expect_opt_string, expect_opt_u32};
use crate::error::{ShiftError, ShiftResult};

const INDEX_OPTIONS: &[&str] = &["unique", "type", "name", "limit", "where"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    #[default]
    Index,
    Unique,
    Fulltext,
}

impl std::str::FromStr for IndexType {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "index" => Ok(Self::Index),
            "unique" => Ok(Self::Unique),
            "fulltext" => Ok(Self::Fulltext),
            other => Err(ShiftError::invalid_value(
                "index",
                "type",
                format!("unknown index type '{}'", other),
            )),
        }
    }
}

/// An index, identified either by its columns or by its name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Index {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub index_type: IndexType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Partial index predicate.
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
}

/// What an adapter should use to find the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTarget<'a> {
    Name(&'a str),
    Columns(&'a [String]),
}

impl Index {
    pub fn new(columns: impl Into<ColumnList>) -> Self {
        Self {
            columns: columns.into().into_vec(),
            ..Self::default()
        }
    }

    /// Name-only index, for dropping when the columns are unknown.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.index_type = IndexType::Unique;
        self
    }

    pub fn fulltext(mut self) -> Self {
        self.index_type = IndexType::Fulltext;
        self
    }

    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn is_unique(&self) -> bool {
        self.index_type == IndexType::Unique
    }

    /// Apply an option map; fails before changing anything if a key is unknown.
    pub fn set_options(&mut self, options: &Options) -> ShiftResult<()> {
        check_keys("index", options, INDEX_OPTIONS)?;
        for (key, value) in options {
            match key.as_str() {
                "unique" => {
                    if expect_bool("index", key, value)? {
                        self.index_type = IndexType::Unique;
                    } else if self.index_type == IndexType::Unique {
                        self.index_type = IndexType::Index;
                    }
                }
                "type" => {
                    if let Some(kind) = expect_opt_string("index", key, value)? {
                        self.index_type = kind.parse()?;
                    }
                }
                "name" => self.name = expect_opt_string("index", key, value)?,
                "limit" => self.limit = expect_opt_u32("index", key, value)?,
                "where" => self.predicate = expect_opt_string("index", key, value)?,
                other => return Err(ShiftError::invalid_option("index", other)),
            }
        }
        Ok(())
    }

    /// Resolve how the index is identified: by name when one is set,
    /// otherwise by its columns.
    pub fn target(&self) -> ShiftResult<IndexTarget<'_>> {
        match (&self.name, self.columns.is_empty()) {
            (Some(name), _) if !name.is_empty() => Ok(IndexTarget::Name(name)),
            (_, false) => Ok(IndexTarget::Columns(&self.columns)),
            _ => Err(ShiftError::InvalidState(
                "index has neither columns nor a name".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn options(value: Value) -> Options {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_unrecognized_option() {
        let mut index = Index::new("title");
        let err = index.set_options(&options(json!({ "0": "type" }))).unwrap_err();
        assert_eq!(err.to_string(), "\"0\" is not a valid index option.");
    }

    #[test]
    fn test_set_options() {
        let mut index = Index::new(["user_id", "slug"]);
        index
            .set_options(&options(json!({ "unique": true, "name": "UNIQUE_SLUG" })))
            .unwrap();
        assert!(index.is_unique());
        assert_eq!(index.name.as_deref(), Some("UNIQUE_SLUG"));

        index.set_options(&options(json!({ "type": "fulltext" }))).unwrap();
        assert_eq!(index.index_type, IndexType::Fulltext);
    }

    #[test]
    fn test_target() {
        assert_eq!(
            Index::named("BY_NAME").target().unwrap(),
            IndexTarget::Name("BY_NAME")
        );

        let by_columns = Index::new(["a", "b"]);
        assert!(matches!(
            by_columns.target().unwrap(),
            IndexTarget::Columns(cols) if cols.len() == 2
        ));

        let err = Index::default().target().unwrap_err();
        assert!(matches!(err, ShiftError::InvalidState(_)));
    }
}
