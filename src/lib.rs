//! # schemashift: schema diffs and migration action plans
//!
//! Compares schema snapshots and describes schema mutations as typed,
//! reversible actions. Turning an action into SQL is left to an adapter
//! (see [`plan::ActionCompiler`]); the engine never talks to a database.
//!
//! ## Quick Example
//!
//! ```rust
//! use schemashift::prelude::*;
//!
//! let baseline = Snapshot::new().table(
//!     TableSchema::new("articles").column(Column::new("title", ColumnType::String)),
//! );
//! let current = Snapshot::new().table(
//!     TableSchema::new("articles")
//!         .column(Column::new("title", ColumnType::String))
//!         .column(Column::new("body", ColumnType::Text)),
//! );
//!
//! let diff = diff_snapshots(&baseline, &current);
//! assert!(diff.columns["articles"].add.contains_key("body"));
//! ```
//!
//! ## Layers
//!
//! | Module     | Role                                              |
//! |------------|---------------------------------------------------|
//! | `table`    | Tables, columns, indexes, foreign keys            |
//! | `action`   | One struct per mutation, wrapped in `Action`      |
//! | `plan`     | `Intent`, `AlterTable`, `NewTable`                |
//! | `alter`    | ALTER fragments plus stateful post-steps          |
//! | `snapshot` | JSON lock files                                   |
//! | `diff`     | Baseline vs current comparison                    |
//! | `parser`   | `name:type[len]:index:NAME` field specs           |

pub mod action;
pub mod alter;
pub mod config;
pub mod diff;
pub mod error;
pub mod parser;
pub mod plan;
pub mod snapshot;
pub mod table;

pub mod prelude {
    pub use crate::action::*;
    pub use crate::alter::{AlterInstructions, Executor, PostStep, StepState};
    pub use crate::config::{ColumnDefaults, DiffOptions, EngineConfig};
    pub use crate::diff::{SchemaDiff, diff_snapshots, diff_snapshots_with};
    pub use crate::error::*;
    pub use crate::plan::{ActionCompiler, AlterTable, Intent, NewTable};
    pub use crate::snapshot::{Constraint, Snapshot, TableSchema};
    pub use crate::table::{
        Column, ColumnType, FkAction, ForeignKey, Index, IndexType, Literal, Options, Table,
    };
}

/// Diff two snapshots with default options.
///
/// # Example
///
/// ```
/// use schemashift::snapshot::Snapshot;
///
/// let snapshot = Snapshot::from_json(r#"{ "users": { "columns": {} } }"#).unwrap();
/// assert!(schemashift::diff(&snapshot, &snapshot).is_empty());
/// ```
pub fn diff(baseline: &snapshot::Snapshot, current: &snapshot::Snapshot) -> diff::SchemaDiff {
    diff::diff_snapshots(baseline, current)
}
