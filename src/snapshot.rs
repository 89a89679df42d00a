//! Schema snapshots
//!
//! A snapshot is an ordered map of table name to table schema, persisted as a
//! JSON lock file. A table may map to `null`; such an entry is never compared
//! by the differ.
//!
//! ```json
//! {
//!   "users": {
//!     "columns": { "id": { "type": "integer", "null": false, "identity": true } },
//!     "indexes": { "BY_EMAIL": { "columns": ["email"], "type": "unique" } },
//!     "constraints": { "primary": { "type": "primary", "columns": ["id"] } }
//!   }
//! }
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ShiftResult;
use crate::table::{Column, ForeignKey, Index};

/// A named table constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Constraint {
    Primary { columns: Vec<String> },
    Unique { columns: Vec<String> },
    Foreign(ForeignKey),
}

impl Constraint {
    pub fn columns(&self) -> &[String] {
        match self {
            Self::Primary { columns } | Self::Unique { columns } => columns,
            Self::Foreign(fk) => &fk.columns,
        }
    }
}

/// Columns, indexes and constraints of one table, each keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableSchema {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub columns: IndexMap<String, Column>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub indexes: IndexMap<String, Index>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub constraints: IndexMap<String, Constraint>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a column, keyed by its name.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.insert(column.name.clone(), column);
        self
    }

    /// Add an index under `name`; the index takes the name if it has none.
    pub fn index(mut self, name: impl Into<String>, mut index: Index) -> Self {
        let name = name.into();
        index.name.get_or_insert_with(|| name.clone());
        self.indexes.insert(name, index);
        self
    }

    /// Add a constraint under `name`; a foreign key takes the name if it has none.
    pub fn constraint(mut self, name: impl Into<String>, mut constraint: Constraint) -> Self {
        let name = name.into();
        if let Constraint::Foreign(fk) = &mut constraint {
            fk.constraint.get_or_insert_with(|| name.clone());
        }
        self.constraints.insert(name, constraint);
        self
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    fn normalize_names(&mut self, key: &str) {
        if self.name.is_empty() {
            self.name = key.to_string();
        }
        for (name, column) in self.columns.iter_mut() {
            if column.name.is_empty() {
                column.name = name.clone();
            }
        }
        for (name, index) in self.indexes.iter_mut() {
            index.name.get_or_insert_with(|| name.clone());
        }
        for (name, constraint) in self.constraints.iter_mut() {
            if let Constraint::Foreign(fk) = constraint {
                fk.constraint.get_or_insert_with(|| name.clone());
            }
        }
    }
}

/// Ordered table name -> schema map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    pub tables: IndexMap<String, Option<TableSchema>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, keyed by its name.
    pub fn add_table(&mut self, mut table: TableSchema) {
        let key = table.name.clone();
        table.normalize_names(&key);
        self.tables.insert(key, Some(table));
    }

    /// Record a table whose descriptor is unknown.
    pub fn add_unknown(&mut self, name: impl Into<String>) {
        self.tables.insert(name.into(), None);
    }

    /// Builder form of [`Snapshot::add_table`].
    pub fn table(mut self, table: TableSchema) -> Self {
        self.add_table(table);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name).and_then(Option::as_ref)
    }

    /// Names of tables that have a descriptor, in snapshot order.
    pub fn described_tables(&self) -> impl Iterator<Item = (&str, &TableSchema)> {
        self.tables
            .iter()
            .filter_map(|(name, schema)| schema.as_ref().map(|s| (name.as_str(), s)))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Parse a lock file's contents. Empty names are filled from map keys.
    pub fn from_json(content: &str) -> ShiftResult<Self> {
        let mut snapshot: Snapshot = serde_json::from_str(content)?;
        for (key, schema) in snapshot.tables.iter_mut() {
            if let Some(schema) = schema {
                schema.normalize_names(key);
            }
        }
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> ShiftResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ShiftResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&content)?;
        tracing::debug!("Loaded snapshot {} ({} tables)", path.display(), snapshot.len());
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ShiftResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_pretty()?)?;
        tracing::debug!("Saved snapshot {} ({} tables)", path.display(), self.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnType;

    const LOCK: &str = r#"{
        "users": {
            "columns": {
                "id": { "type": "integer", "null": false, "identity": true },
                "email": { "type": "string", "limit": 255 }
            },
            "indexes": {
                "UNIQUE_EMAIL": { "columns": ["email"], "type": "unique" }
            },
            "constraints": {
                "primary": { "type": "primary", "columns": ["id"] },
                "users_team_fk": {
                    "type": "foreign",
                    "columns": ["team_id"],
                    "referenced_table": { "name": "teams" },
                    "referenced_columns": ["id"],
                    "on_delete": "CASCADE"
                }
            }
        },
        "legacy": null
    }"#;

    #[test]
    fn test_from_json_normalizes_names() {
        let snapshot = Snapshot::from_json(LOCK).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("legacy").is_none());

        let users = snapshot.get("users").unwrap();
        assert_eq!(users.name, "users");
        assert_eq!(users.column_names().collect::<Vec<_>>(), vec!["id", "email"]);
        assert_eq!(users.columns["id"].name, "id");
        assert_eq!(users.columns["id"].column_type, Some(ColumnType::Integer));
        assert_eq!(users.indexes["UNIQUE_EMAIL"].name.as_deref(), Some("UNIQUE_EMAIL"));

        match &users.constraints["users_team_fk"] {
            Constraint::Foreign(fk) => {
                assert_eq!(fk.constraint.as_deref(), Some("users_team_fk"));
                assert_eq!(fk.columns, vec!["team_id"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(users.constraints["primary"].columns(), ["id"]);
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let snapshot = Snapshot::from_json(LOCK).unwrap();
        let json = snapshot.to_json_pretty().unwrap();
        let again = Snapshot::from_json(&json).unwrap();
        assert_eq!(snapshot, again);
        assert_eq!(again.tables.keys().collect::<Vec<_>>(), vec!["users", "legacy"]);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("schemashift-{}.lock", std::process::id()));
        let snapshot = Snapshot::new().table(
            TableSchema::new("tags")
                .column(Column::new("id", ColumnType::Integer).identity())
                .index("BY_ID", Index::new("id")),
        );
        snapshot.save(&path).unwrap();
        let loaded = Snapshot::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.described_tables().count(), 1);
    }

    #[test]
    fn test_rejects_unknown_table_keys() {
        assert!(Snapshot::from_json(r#"{ "t": { "colums": {} } }"#).is_err());
    }
}
