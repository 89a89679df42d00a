//! Action Model
//!
//! One struct per schema mutation, wrapped in the closed [`Action`] enum.
//! Every action targets exactly one [`Table`] and is plain data: adapters
//! match on the enum to turn it into SQL.
//!
//! # Example
//! ```
//! use schemashift::action::{Action, AddColumn};
//! use schemashift::config::ColumnDefaults;
//! use schemashift::table::{ColumnType, Options};
//!
//! let add = AddColumn::build("users", "bio", ColumnType::Text, &Options::new(), &ColumnDefaults::default())?;
//! let action = Action::from(add);
//! assert_eq!(action.kind(), "add_column");
//! assert_eq!(action.invert()?.kind(), "remove_column");
//! # Ok::<(), schemashift::error::ShiftError>(())
//! ```

use crate::config::ColumnDefaults;
use crate::error::{ShiftError, ShiftResult};
use crate::table::{Column, ColumnList, ColumnType, ForeignKey, Index, Options, Table};

/// ADD COLUMN
#[derive(Debug, Clone, PartialEq)]
pub struct AddColumn {
    table: Table,
    column: Column,
}

impl AddColumn {
    pub fn new(table: impl Into<Table>, column: Column) -> Self {
        Self {
            table: table.into(),
            column,
        }
    }

    /// Build the column from its parts, validating `options`.
    pub fn build(
        table: impl Into<Table>,
        name: impl Into<String>,
        column_type: impl Into<ColumnType>,
        options: &Options,
        defaults: &ColumnDefaults,
    ) -> ShiftResult<Self> {
        let column = Column::build(name, column_type, options, defaults)?;
        Ok(Self::new(table, column))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn column(&self) -> &Column {
        &self.column
    }
}

/// Redefine an existing column.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeColumn {
    table: Table,
    column_name: String,
    column: Column,
}

impl ChangeColumn {
    /// A nameless `column` takes `column_name`, so the target is never empty.
    pub fn new(table: impl Into<Table>, column_name: impl Into<String>, mut column: Column) -> Self {
        let column_name = column_name.into();
        if column.name.is_empty() {
            column.set_name(column_name.clone());
        }
        Self {
            table: table.into(),
            column_name,
            column,
        }
    }

    pub fn build(
        table: impl Into<Table>,
        column_name: impl Into<String>,
        column_type: impl Into<ColumnType>,
        options: &Options,
        defaults: &ColumnDefaults,
    ) -> ShiftResult<Self> {
        let column_name = column_name.into();
        let column = Column::build(column_name.clone(), column_type, options, defaults)?;
        Ok(Self::new(table, column_name, column))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Name of the column being changed.
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// The new definition.
    pub fn column(&self) -> &Column {
        &self.column
    }
}

/// DROP COLUMN
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveColumn {
    table: Table,
    column: Column,
}

impl RemoveColumn {
    pub fn new(table: impl Into<Table>, column: Column) -> Self {
        Self {
            table: table.into(),
            column,
        }
    }

    pub fn build(table: impl Into<Table>, column_name: impl Into<String>) -> Self {
        Self::new(table, Column::named(column_name))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn column(&self) -> &Column {
        &self.column
    }
}

/// RENAME COLUMN old TO new
#[derive(Debug, Clone, PartialEq)]
pub struct RenameColumn {
    table: Table,
    column: Column,
    new_name: String,
}

impl RenameColumn {
    pub fn new(table: impl Into<Table>, column: Column, new_name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column,
            new_name: new_name.into(),
        }
    }

    pub fn build(
        table: impl Into<Table>,
        column_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::new(table, Column::named(column_name), new_name)
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }
}

/// CREATE INDEX
#[derive(Debug, Clone, PartialEq)]
pub struct AddIndex {
    table: Table,
    index: Index,
}

impl AddIndex {
    pub fn new(table: impl Into<Table>, index: Index) -> Self {
        Self {
            table: table.into(),
            index,
        }
    }

    pub fn build(
        table: impl Into<Table>,
        columns: impl Into<ColumnList>,
        options: &Options,
    ) -> ShiftResult<Self> {
        let mut index = Index::new(columns);
        index.set_options(options)?;
        Ok(Self::new(table, index))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn index(&self) -> &Index {
        &self.index
    }
}

/// DROP INDEX, by columns or by name.
#[derive(Debug, Clone, PartialEq)]
pub struct DropIndex {
    table: Table,
    index: Index,
}

impl DropIndex {
    pub fn new(table: impl Into<Table>, index: Index) -> Self {
        Self {
            table: table.into(),
            index,
        }
    }

    /// Identify the index by the columns it covers.
    pub fn build(table: impl Into<Table>, columns: impl Into<ColumnList>) -> Self {
        Self::new(table, Index::new(columns))
    }

    /// Identify the index by name only.
    pub fn build_from_name(table: impl Into<Table>, name: impl Into<String>) -> Self {
        Self::new(table, Index::named(name))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn index(&self) -> &Index {
        &self.index
    }
}

/// ADD CONSTRAINT ... FOREIGN KEY
#[derive(Debug, Clone, PartialEq)]
pub struct AddForeignKey {
    table: Table,
    foreign_key: ForeignKey,
}

impl AddForeignKey {
    /// Fails if the local and referenced column lists differ in length.
    pub fn new(table: impl Into<Table>, foreign_key: ForeignKey) -> ShiftResult<Self> {
        foreign_key.validate()?;
        Ok(Self {
            table: table.into(),
            foreign_key,
        })
    }

    /// `referenced_table` may be a [`Table`] or a bare name; a single
    /// referenced column becomes a one-element list.
    pub fn build(
        table: impl Into<Table>,
        columns: impl Into<ColumnList>,
        referenced_table: impl Into<Table>,
        referenced_columns: impl Into<ColumnList>,
        options: &Options,
    ) -> ShiftResult<Self> {
        let mut foreign_key = ForeignKey::new(columns).references(referenced_table, referenced_columns);
        foreign_key.set_options(options)?;
        Self::new(table, foreign_key)
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn foreign_key(&self) -> &ForeignKey {
        &self.foreign_key
    }
}

/// DROP CONSTRAINT for a foreign key.
#[derive(Debug, Clone, PartialEq)]
pub struct DropForeignKey {
    table: Table,
    foreign_key: ForeignKey,
}

impl DropForeignKey {
    pub fn new(table: impl Into<Table>, foreign_key: ForeignKey) -> Self {
        Self {
            table: table.into(),
            foreign_key,
        }
    }

    pub fn build(
        table: impl Into<Table>,
        columns: impl Into<ColumnList>,
        constraint: Option<&str>,
    ) -> Self {
        let mut foreign_key = ForeignKey::new(columns);
        foreign_key.constraint = constraint.map(str::to_string);
        Self::new(table, foreign_key)
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn foreign_key(&self) -> &ForeignKey {
        &self.foreign_key
    }
}

/// RENAME TO
#[derive(Debug, Clone, PartialEq)]
pub struct RenameTable {
    table: Table,
    new_name: String,
}

impl RenameTable {
    pub fn new(table: impl Into<Table>, new_name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            new_name: new_name.into(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }
}

/// Set or clear the table comment.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeComment {
    table: Table,
    new_comment: Option<String>,
}

impl ChangeComment {
    pub fn new(table: impl Into<Table>, new_comment: Option<String>) -> Self {
        Self {
            table: table.into(),
            new_comment,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn new_comment(&self) -> Option<&str> {
        self.new_comment.as_deref()
    }
}

/// CREATE TABLE, as recorded for inversion.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    table: Table,
}

impl CreateTable {
    pub fn new(table: impl Into<Table>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

/// DROP TABLE
#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    table: Table,
}

impl DropTable {
    pub fn new(table: impl Into<Table>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

/// A single schema mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddColumn(AddColumn),
    ChangeColumn(ChangeColumn),
    RemoveColumn(RemoveColumn),
    RenameColumn(RenameColumn),
    AddIndex(AddIndex),
    DropIndex(DropIndex),
    AddForeignKey(AddForeignKey),
    DropForeignKey(DropForeignKey),
    RenameTable(RenameTable),
    ChangeComment(ChangeComment),
    CreateTable(CreateTable),
    DropTable(DropTable),
}

impl Action {
    /// The table this action applies to.
    pub fn table(&self) -> &Table {
        match self {
            Self::AddColumn(a) => a.table(),
            Self::ChangeColumn(a) => a.table(),
            Self::RemoveColumn(a) => a.table(),
            Self::RenameColumn(a) => a.table(),
            Self::AddIndex(a) => a.table(),
            Self::DropIndex(a) => a.table(),
            Self::AddForeignKey(a) => a.table(),
            Self::DropForeignKey(a) => a.table(),
            Self::RenameTable(a) => a.table(),
            Self::ChangeComment(a) => a.table(),
            Self::CreateTable(a) => a.table(),
            Self::DropTable(a) => a.table(),
        }
    }

    /// Stable snake_case name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddColumn(_) => "add_column",
            Self::ChangeColumn(_) => "change_column",
            Self::RemoveColumn(_) => "remove_column",
            Self::RenameColumn(_) => "rename_column",
            Self::AddIndex(_) => "add_index",
            Self::DropIndex(_) => "drop_index",
            Self::AddForeignKey(_) => "add_foreign_key",
            Self::DropForeignKey(_) => "drop_foreign_key",
            Self::RenameTable(_) => "rename_table",
            Self::ChangeComment(_) => "change_comment",
            Self::CreateTable(_) => "create_table",
            Self::DropTable(_) => "drop_table",
        }
    }

    /// The action that undoes this one.
    ///
    /// Only mutations whose previous state is fully known from the action
    /// itself can be inverted; the rest fail with [`ShiftError::Irreversible`].
    pub fn invert(&self) -> ShiftResult<Action> {
        let inverted = match self {
            Self::CreateTable(a) => DropTable::new(a.table.clone()).into(),
            Self::RenameTable(a) => {
                let mut renamed = a.table.clone();
                renamed.name = a.new_name.clone();
                RenameTable::new(renamed, a.table.name.clone()).into()
            }
            Self::AddColumn(a) => RemoveColumn::new(a.table.clone(), a.column.clone()).into(),
            Self::RenameColumn(a) => {
                let mut renamed = a.column.clone();
                renamed.set_name(a.new_name.clone());
                RenameColumn::new(a.table.clone(), renamed, a.column.name.clone()).into()
            }
            Self::AddIndex(a) => DropIndex::new(a.table.clone(), a.index.clone()).into(),
            Self::AddForeignKey(a) => {
                DropForeignKey::new(a.table.clone(), a.foreign_key.clone()).into()
            }
            other => return Err(ShiftError::Irreversible(other.kind())),
        };
        Ok(inverted)
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Action {
                fn from(action: $variant) -> Self {
                    Action::$variant(action)
                }
            }
        )*
    };
}

impl_from_variant!(
    AddColumn,
    ChangeColumn,
    RemoveColumn,
    RenameColumn,
    AddIndex,
    DropIndex,
    AddForeignKey,
    DropForeignKey,
    RenameTable,
    ChangeComment,
    CreateTable,
    DropTable,
);
