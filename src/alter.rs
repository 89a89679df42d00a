//! ALTER instructions
//!
//! Collects the fragments of one combined `ALTER TABLE` statement plus the
//! steps that must run after it. Fragments are opaque SQL produced by an
//! adapter.
//!
//! # Example
//! ```
//! use schemashift::alter::AlterInstructions;
//! use schemashift::error::ShiftResult;
//!
//! let mut instructions = AlterInstructions::default();
//! instructions.add_alter("ADD COLUMN bio TEXT");
//! instructions.add_post_step("UPDATE users SET bio = ''");
//!
//! let mut executed = Vec::new();
//! let mut executor = |sql: &str| -> ShiftResult<()> {
//!     executed.push(sql.to_string());
//!     Ok(())
//! };
//! instructions.execute("ALTER TABLE users {}", &mut executor)?;
//! assert_eq!(executed, ["ALTER TABLE users ADD COLUMN bio TEXT", "UPDATE users SET bio = ''"]);
//! # Ok::<(), schemashift::error::ShiftError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{ShiftError, ShiftResult};

/// Placeholder replaced by the joined ALTER fragments.
pub const PLACEHOLDER: &str = "{}";

/// State threaded from one step function to the next.
pub type StepState = Map<String, Value>;

/// Runs one SQL statement.
pub trait Executor {
    fn execute(&mut self, sql: &str) -> ShiftResult<()>;
}

impl<F> Executor for F
where
    F: FnMut(&str) -> ShiftResult<()>,
{
    fn execute(&mut self, sql: &str) -> ShiftResult<()> {
        self(sql)
    }
}

/// A step function: receives the running state and the executor, returns the
/// state for the next step.
pub type StepFn = Arc<dyn Fn(StepState, &mut dyn Executor) -> ShiftResult<StepState> + Send + Sync>;

/// Work that runs after the ALTER statement.
#[derive(Clone)]
pub enum PostStep {
    /// Raw SQL handed to the executor; does not touch the state.
    Sql(String),
    Step(StepFn),
}

impl PostStep {
    pub fn sql(sql: impl Into<String>) -> Self {
        Self::Sql(sql.into())
    }

    pub fn step<F>(f: F) -> Self
    where
        F: Fn(StepState, &mut dyn Executor) -> ShiftResult<StepState> + Send + Sync + 'static,
    {
        Self::Step(Arc::new(f))
    }
}

impl fmt::Debug for PostStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(sql) => f.debug_tuple("Sql").field(sql).finish(),
            Self::Step(_) => f.write_str("Step(<fn>)"),
        }
    }
}

impl From<String> for PostStep {
    fn from(sql: String) -> Self {
        Self::Sql(sql)
    }
}

impl From<&str> for PostStep {
    fn from(sql: &str) -> Self {
        Self::Sql(sql.to_string())
    }
}

/// Fragments for one ALTER statement plus ordered post-steps.
#[derive(Debug, Clone, Default)]
pub struct AlterInstructions {
    alter_parts: Vec<String>,
    post_steps: Vec<PostStep>,
}

impl AlterInstructions {
    pub fn new(alter_parts: Vec<String>, post_steps: Vec<PostStep>) -> Self {
        Self {
            alter_parts,
            post_steps,
        }
    }

    pub fn add_alter(&mut self, fragment: impl Into<String>) {
        self.alter_parts.push(fragment.into());
    }

    pub fn add_post_step(&mut self, step: impl Into<PostStep>) {
        self.post_steps.push(step.into());
    }

    pub fn alter_parts(&self) -> &[String] {
        &self.alter_parts
    }

    pub fn post_steps(&self) -> &[PostStep] {
        &self.post_steps
    }

    pub fn is_empty(&self) -> bool {
        self.alter_parts.is_empty() && self.post_steps.is_empty()
    }

    /// Append `other`'s fragments and post-steps, in order, without dedup.
    pub fn merge(&mut self, other: &AlterInstructions) {
        self.alter_parts.extend(other.alter_parts.iter().cloned());
        self.post_steps.extend(other.post_steps.iter().cloned());
    }

    /// Run the ALTER statement (if any fragments exist), then every post-step.
    ///
    /// `template` must contain exactly one `{}`, which is replaced by the
    /// fragments joined with `", "`. The first error from the executor or a
    /// step is returned as-is and the remaining steps are skipped.
    pub fn execute<E: Executor>(&self, template: &str, executor: &mut E) -> ShiftResult<()> {
        if !self.alter_parts.is_empty() {
            let sql = render(template, &self.alter_parts)?;
            tracing::debug!("Executing ALTER: {}", sql);
            executor.execute(&sql)?;
        }

        let mut state = StepState::new();
        for (i, step) in self.post_steps.iter().enumerate() {
            match step {
                PostStep::Sql(sql) => {
                    tracing::debug!("Post-step {}: {}", i, sql);
                    executor.execute(sql)?;
                }
                PostStep::Step(f) => {
                    tracing::debug!("Post-step {}: step function ({} state keys)", i, state.len());
                    state = (**f)(state, &mut *executor)?;
                }
            }
        }
        Ok(())
    }
}

fn render(template: &str, parts: &[String]) -> ShiftResult<String> {
    match template.matches(PLACEHOLDER).count() {
        1 => Ok(template.replacen(PLACEHOLDER, &parts.join(", "), 1)),
        n => Err(ShiftError::Template(format!(
            "expected exactly one '{}' placeholder, found {} in '{}'",
            PLACEHOLDER, n, template
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn recorder(log: &mut Vec<String>) -> impl FnMut(&str) -> ShiftResult<()> + '_ {
        move |sql: &str| {
            log.push(sql.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_execute_joins_fragments() {
        let mut instructions = AlterInstructions::default();
        instructions.add_alter("ADD COLUMN a INT");
        instructions.add_alter("DROP COLUMN b");

        let mut log = Vec::new();
        instructions
            .execute("ALTER TABLE t {}", &mut recorder(&mut log))
            .unwrap();
        assert_eq!(log, vec!["ALTER TABLE t ADD COLUMN a INT, DROP COLUMN b"]);
    }

    #[test]
    fn test_state_threading() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut instructions = AlterInstructions::default();
        let first_seen = Arc::clone(&seen);
        instructions.add_post_step(PostStep::step(move |state, _| {
            first_seen.lock().unwrap().push(state.clone());
            Ok(json!({ "count": 1 }).as_object().cloned().unwrap())
        }));
        instructions.add_post_step("SELECT 1");
        let second_seen = Arc::clone(&seen);
        instructions.add_post_step(PostStep::step(move |state, _| {
            second_seen.lock().unwrap().push(state.clone());
            Ok(json!({ "count": 2 }).as_object().cloned().unwrap())
        }));

        let mut log = Vec::new();
        instructions
            .execute("ALTER TABLE t {}", &mut recorder(&mut log))
            .unwrap();

        // no ALTER without fragments, raw SQL passes state through
        assert_eq!(log, vec!["SELECT 1"]);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_empty());
        assert_eq!(Value::Object(seen[1].clone()), json!({ "count": 1 }));
    }

    #[test]
    fn test_step_can_use_executor() {
        let mut instructions = AlterInstructions::default();
        instructions.add_post_step(PostStep::step(|state, executor| {
            executor.execute("UPDATE t SET a = 0")?;
            Ok(state)
        }));

        let mut log = Vec::new();
        instructions.execute("{}", &mut recorder(&mut log)).unwrap();
        assert_eq!(log, vec!["UPDATE t SET a = 0"]);
    }

    #[test]
    fn test_executor_failure_aborts() {
        let mut instructions = AlterInstructions::default();
        instructions.add_alter("ADD COLUMN a INT");
        instructions.add_post_step("UPDATE t SET a = 1");

        let mut calls = 0;
        let mut failing = |_: &str| -> ShiftResult<()> {
            calls += 1;
            Err(ShiftError::Execution("boom".into()))
        };
        let err = instructions.execute("ALTER TABLE t {}", &mut failing).unwrap_err();
        assert_eq!(err.to_string(), "Execution error: boom");
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_failing_step_skips_later_steps() {
        let mut instructions = AlterInstructions::default();
        instructions.add_alter("ADD COLUMN a INT");
        instructions.add_post_step("UPDATE t SET a = 1");
        instructions.add_post_step(PostStep::step(|_, _| {
            Err(ShiftError::Execution("step failed".into()))
        }));
        instructions.add_post_step("UPDATE t SET a = 2");

        let mut log = Vec::new();
        let err = instructions
            .execute("ALTER TABLE t {}", &mut recorder(&mut log))
            .unwrap_err();
        assert!(matches!(&err, ShiftError::Execution(msg) if msg == "step failed"));
        assert_eq!(log, vec!["ALTER TABLE t ADD COLUMN a INT", "UPDATE t SET a = 1"]);

        let mut instructions = AlterInstructions::default();
        instructions.add_post_step("UPDATE t SET a = 1");
        instructions.add_post_step("UPDATE t SET a = 2");
        let mut calls = Vec::new();
        let mut failing_second = |sql: &str| -> ShiftResult<()> {
            calls.push(sql.to_string());
            if calls.len() == 1 {
                Ok(())
            } else {
                Err(ShiftError::Execution(format!("rejected {}", sql)))
            }
        };
        let err = instructions.execute("{}", &mut failing_second).unwrap_err();
        assert_eq!(err.to_string(), "Execution error: rejected UPDATE t SET a = 2");
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn test_template_must_have_one_placeholder() {
        let mut instructions = AlterInstructions::default();
        instructions.add_alter("ADD COLUMN a INT");

        let mut log = Vec::new();
        let err = instructions
            .execute("ALTER TABLE t", &mut recorder(&mut log))
            .unwrap_err();
        assert!(matches!(err, ShiftError::Template(_)));
        let err = instructions
            .execute("ALTER TABLE {} {}", &mut recorder(&mut log))
            .unwrap_err();
        assert!(matches!(err, ShiftError::Template(_)));
        assert!(log.is_empty());

        // without fragments the template is never rendered
        AlterInstructions::default()
            .execute("no placeholder", &mut recorder(&mut log))
            .unwrap();
    }

    #[test]
    fn test_merge_keeps_other() {
        let mut a = AlterInstructions::new(vec!["A1".into()], vec!["P1".into()]);
        let b = AlterInstructions::new(vec!["B1".into(), "A1".into()], vec!["P2".into()]);
        a.merge(&b);

        assert_eq!(a.alter_parts(), ["A1", "B1", "A1"]);
        assert_eq!(a.post_steps().len(), 2);
        assert_eq!(b.alter_parts(), ["B1", "A1"]);
        assert!(!a.is_empty());
        assert!(AlterInstructions::default().is_empty());
    }
}
