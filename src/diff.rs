//! Schema Diff
//!
//! Compares a baseline snapshot with the current one and reports which
//! tables, columns, indexes and constraints were added, removed or changed.
//! Renames are never inferred: a renamed column shows up as one removal and
//! one addition.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::DiffOptions;
use crate::snapshot::{Constraint, Snapshot, TableSchema};
use crate::table::{Column, Index};

/// Attribute never compared: it only describes placement.
const POSITION_ATTRIBUTE: &str = "after";

/// Tables present in only one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableDiff {
    pub add: IndexSet<String>,
    pub remove: IndexSet<String>,
}

impl TableDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Column changes on one table.
///
/// `remove` keeps the baseline definition so a down migration can recreate
/// the column. `changed` holds only the attributes that differ, with their
/// current values (`null` when the attribute is gone).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnDiff {
    pub add: IndexMap<String, Column>,
    pub remove: IndexMap<String, Column>,
    pub changed: IndexMap<String, Map<String, Value>>,
}

impl ColumnDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty() && self.changed.is_empty()
    }
}

/// Index or constraint changes on one table.
///
/// A definition that changed under the same name appears in both `remove`
/// (old) and `add` (new); there is no in-place change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDiff<T> {
    pub add: IndexMap<String, T>,
    pub remove: IndexMap<String, T>,
}

impl<T> Default for EntityDiff<T> {
    fn default() -> Self {
        Self {
            add: IndexMap::new(),
            remove: IndexMap::new(),
        }
    }
}

impl<T> EntityDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Result of comparing two snapshots.
///
/// Per-table maps only contain tables present in both snapshots that
/// actually changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDiff {
    pub tables: TableDiff,
    pub columns: IndexMap<String, ColumnDiff>,
    pub indexes: IndexMap<String, EntityDiff<Index>>,
    pub constraints: IndexMap<String, EntityDiff<Constraint>>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.columns.is_empty()
            && self.indexes.is_empty()
            && self.constraints.is_empty()
    }

    /// Common tables with at least one change, in current snapshot order.
    pub fn changed_tables(&self) -> IndexSet<&str> {
        self.columns
            .keys()
            .chain(self.indexes.keys())
            .chain(self.constraints.keys())
            .map(String::as_str)
            .collect()
    }
}

/// Diff two snapshots with default options.
pub fn diff_snapshots(baseline: &Snapshot, current: &Snapshot) -> SchemaDiff {
    diff_snapshots_with(baseline, current, &DiffOptions::default())
}

/// Diff two snapshots.
///
/// Tables whose descriptor is `null` count as absent: they can be added or
/// removed but are never compared.
pub fn diff_snapshots_with(
    baseline: &Snapshot,
    current: &Snapshot,
    options: &DiffOptions,
) -> SchemaDiff {
    let mut diff = SchemaDiff::default();

    for (name, _) in current.described_tables() {
        if baseline.get(name).is_none() {
            diff.tables.add.insert(name.to_string());
        }
    }
    for (name, _) in baseline.described_tables() {
        if current.get(name).is_none() {
            diff.tables.remove.insert(name.to_string());
        }
    }

    for (name, current_table) in current.described_tables() {
        let Some(baseline_table) = baseline.get(name) else {
            continue;
        };

        let columns = diff_columns(baseline_table, current_table, options);
        let indexes = diff_entities(&baseline_table.indexes, &current_table.indexes);
        let constraints = diff_entities(&baseline_table.constraints, &current_table.constraints);

        tracing::trace!(
            "Table {}: columns +{} -{} ~{}, indexes +{} -{}, constraints +{} -{}",
            name,
            columns.add.len(),
            columns.remove.len(),
            columns.changed.len(),
            indexes.add.len(),
            indexes.remove.len(),
            constraints.add.len(),
            constraints.remove.len()
        );

        if !columns.is_empty() {
            diff.columns.insert(name.to_string(), columns);
        }
        if !indexes.is_empty() {
            diff.indexes.insert(name.to_string(), indexes);
        }
        if !constraints.is_empty() {
            diff.constraints.insert(name.to_string(), constraints);
        }
    }

    tracing::debug!(
        "Schema diff: {} table(s) added, {} removed, {} changed",
        diff.tables.add.len(),
        diff.tables.remove.len(),
        diff.changed_tables().len()
    );
    diff
}

fn diff_columns(baseline: &TableSchema, current: &TableSchema, options: &DiffOptions) -> ColumnDiff {
    let mut diff = ColumnDiff::default();

    let mut previous: Option<&str> = None;
    for (name, column) in &current.columns {
        match baseline.columns.get(name) {
            None => {
                let mut added = column.clone();
                if options.position_hints && added.after.is_none() {
                    added.after = previous.map(str::to_string);
                }
                diff.add.insert(name.clone(), added);
            }
            Some(old) => {
                let changed = changed_attributes(old, column, options);
                if !changed.is_empty() {
                    diff.changed.insert(name.clone(), changed);
                }
            }
        }
        previous = Some(name.as_str());
    }

    let mut previous: Option<&str> = None;
    for (name, column) in &baseline.columns {
        if !current.columns.contains_key(name) {
            let mut removed = column.clone();
            if options.position_hints {
                removed.after = previous.map(str::to_string);
            }
            diff.remove.insert(name.clone(), removed);
        }
        previous = Some(name.as_str());
    }

    diff
}

/// Attributes of `current` that differ from `baseline`, excluding positional
/// and ignored ones. Attributes only in `baseline` map to `null`.
fn changed_attributes(baseline: &Column, current: &Column, options: &DiffOptions) -> Map<String, Value> {
    let old = baseline.attributes();
    let new = current.attributes();
    let compared = |key: &str| key != POSITION_ATTRIBUTE && !options.is_ignored(key);

    let mut changed = Map::new();
    for (key, value) in &new {
        if compared(key) && old.get(key) != Some(value) {
            changed.insert(key.clone(), value.clone());
        }
    }
    for key in old.keys() {
        if compared(key) && !new.contains_key(key) {
            changed.insert(key.clone(), Value::Null);
        }
    }
    changed
}

/// An entity stored under a map key that may also carry that key as its name.
trait Keyed: Clone + PartialEq {
    fn keyed(&self, key: &str) -> Self;
}

impl Keyed for Index {
    fn keyed(&self, key: &str) -> Self {
        let mut index = self.clone();
        index.name.get_or_insert_with(|| key.to_string());
        index
    }
}

impl Keyed for Constraint {
    fn keyed(&self, key: &str) -> Self {
        let mut constraint = self.clone();
        if let Constraint::Foreign(fk) = &mut constraint {
            fk.constraint.get_or_insert_with(|| key.to_string());
        }
        constraint
    }
}

/// Add/remove by name; a changed definition becomes remove (old) + add (new).
/// A missing name counts as the map key.
fn diff_entities<T: Keyed>(
    baseline: &IndexMap<String, T>,
    current: &IndexMap<String, T>,
) -> EntityDiff<T> {
    let mut diff = EntityDiff::default();
    for (name, entity) in current {
        let entity = entity.keyed(name);
        if baseline.get(name).map(|old| old.keyed(name)) != Some(entity.clone()) {
            diff.add.insert(name.clone(), entity);
        }
    }
    for (name, entity) in baseline {
        let entity = entity.keyed(name);
        if current.get(name).map(|new| new.keyed(name)) != Some(entity.clone()) {
            diff.remove.insert(name.clone(), entity);
        }
    }
    diff
}
