//! Plans: containers of actions.
//!
//! - [`Intent`]: every action of one migration, across tables
//! - [`AlterTable`]: the ordered actions for one existing table
//! - [`NewTable`]: columns and indexes for a single `CREATE TABLE`
//!
//! These are pure containers; they never check that an action's table
//! matches the plan's table.

use indexmap::IndexMap;

use crate::action::Action;
use crate::alter::{AlterInstructions, Executor};
use crate::error::ShiftResult;
use crate::table::{Column, Index, Table};

/// Turns one action into dialect-specific instructions.
///
/// Implemented by adapters; the engine itself ships no dialect.
pub trait ActionCompiler {
    fn compile(&self, action: &Action) -> ShiftResult<AlterInstructions>;
}

/// All actions of one migration, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intent {
    actions: Vec<Action>,
}

impl Intent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, action: impl Into<Action>) {
        self.actions.push(action.into());
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<Action> {
        self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Append `other`'s actions after ours. Nothing is reordered or deduplicated.
    pub fn merge(&mut self, other: Intent) {
        self.actions.extend(other.actions);
    }

    /// The intent that undoes this one: each action inverted, last first.
    pub fn inverted(&self) -> ShiftResult<Intent> {
        let actions = self
            .actions
            .iter()
            .rev()
            .map(Action::invert)
            .collect::<ShiftResult<Vec<_>>>()?;
        Ok(Intent { actions })
    }

    /// Group actions per table (by qualified name) in first-seen order.
    pub fn tables(&self) -> Vec<AlterTable> {
        let mut grouped: IndexMap<String, AlterTable> = IndexMap::new();
        for action in &self.actions {
            grouped
                .entry(action.table().qualified_name())
                .or_insert_with(|| AlterTable::new(action.table().clone()))
                .add_action(action.clone());
        }
        grouped.into_values().collect()
    }
}

impl FromIterator<Action> for Intent {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

/// Ordered actions against one existing table.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    table: Table,
    actions: Vec<Action>,
}

impl AlterTable {
    pub fn new(table: impl Into<Table>) -> Self {
        Self {
            table: table.into(),
            actions: Vec::new(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn add_action(&mut self, action: impl Into<Action>) {
        self.actions.push(action.into());
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Compile every action and merge the results in action order.
    pub fn compile<C: ActionCompiler + ?Sized>(&self, compiler: &C) -> ShiftResult<AlterInstructions> {
        let mut instructions = AlterInstructions::default();
        for action in &self.actions {
            instructions.merge(&compiler.compile(action)?);
        }
        Ok(instructions)
    }

    /// Compile, then execute against `template`.
    pub fn apply<C, E>(&self, compiler: &C, template: &str, executor: &mut E) -> ShiftResult<()>
    where
        C: ActionCompiler + ?Sized,
        E: Executor,
    {
        tracing::debug!(
            "Applying {} action(s) to {}",
            self.actions.len(),
            self.table.qualified_name()
        );
        self.compile(compiler)?.execute(template, executor)
    }
}

/// Columns and indexes for one `CREATE TABLE`.
///
/// Order is significant: columns are created in insertion order and indexes
/// are added in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTable {
    table: Table,
    columns: Vec<Column>,
    indexes: Vec<Index>,
}

impl NewTable {
    pub fn new(table: impl Into<Table>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{AddColumn, AddIndex, DropTable, RemoveColumn, RenameColumn};
    use crate::error::ShiftError;
    use crate::table::ColumnType;

    struct Echo;

    impl ActionCompiler for Echo {
        fn compile(&self, action: &Action) -> ShiftResult<AlterInstructions> {
            let mut instructions = AlterInstructions::default();
            match action {
                Action::AddColumn(a) => instructions.add_alter(format!("ADD {}", a.column().name)),
                Action::RemoveColumn(a) => {
                    instructions.add_alter(format!("DROP {}", a.column().name))
                }
                other => instructions.add_post_step(format!("-- {}", other.kind())),
            }
            Ok(instructions)
        }
    }

    #[test]
    fn test_tables_groups_in_first_seen_order() {
        let mut intent = Intent::new();
        intent.add_action(RemoveColumn::build("posts", "legacy"));
        intent.add_action(AddColumn::new("users", Column::new("bio", ColumnType::Text)));
        intent.add_action(RenameColumn::build("posts", "title", "headline"));

        let tables = intent.tables();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].table().name, "posts");
        assert_eq!(
            tables[0].actions().iter().map(Action::kind).collect::<Vec<_>>(),
            vec!["remove_column", "rename_column"]
        );
        assert_eq!(tables[1].table().name, "users");
    }

    #[test]
    fn test_inverted_reverses_order() {
        let mut intent = Intent::new();
        intent.add_action(AddColumn::new("users", Column::new("bio", ColumnType::Text)));
        intent.add_action(AddIndex::new("users", Index::new("bio")));

        let inverted = intent.inverted().unwrap();
        assert_eq!(
            inverted.actions().iter().map(Action::kind).collect::<Vec<_>>(),
            vec!["drop_index", "remove_column"]
        );

        intent.add_action(DropTable::new("users"));
        assert!(matches!(intent.inverted(), Err(ShiftError::Irreversible(_))));
    }

    #[test]
    fn test_alter_table_apply() {
        let mut alter = AlterTable::new("users");
        alter.add_action(AddColumn::new("users", Column::new("bio", ColumnType::Text)));
        alter.add_action(RemoveColumn::build("users", "legacy"));
        alter.add_action(RenameColumn::build("users", "name", "full_name"));

        let mut log = Vec::new();
        let mut executor = |sql: &str| -> ShiftResult<()> {
            log.push(sql.to_string());
            Ok(())
        };
        alter.apply(&Echo, "ALTER TABLE users {}", &mut executor).unwrap();

        assert_eq!(
            log,
            vec!["ALTER TABLE users ADD bio, DROP legacy", "-- rename_column"]
        );
    }

    #[test]
    fn test_new_table_preserves_order() {
        let mut table = NewTable::new("tags");
        table.add_column(Column::new("id", ColumnType::Integer).identity());
        table.add_column(Column::new("name", ColumnType::String));
        table.add_index(Index::new("name").unique());

        assert_eq!(table.column_names(), vec!["id", "name"]);
        assert!(table.indexes()[0].is_unique());
        assert_eq!(table.table().name, "tags");
    }
}
