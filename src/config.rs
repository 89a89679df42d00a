//! Engine configuration.
//!
//! Loaded from TOML. Every key has a default, so an empty file is a valid config.
//!
//! ```toml
//! [columns]
//! null_default = false
//!
//! [diff]
//! ignored_column_attributes = ["collation", "comment"]
//! position_hints = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ShiftError, ShiftResult};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub columns: ColumnDefaults,
    pub diff: DiffOptions,
}

/// Defaults applied when a column is built.
///
/// Passed explicitly into `Column::with_defaults` and the action `build`
/// helpers instead of living in a global toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnDefaults {
    /// Whether a new column is nullable unless told otherwise.
    #[serde(rename = "null_default")]
    pub null: bool,
}

impl Default for ColumnDefaults {
    fn default() -> Self {
        Self { null: true }
    }
}

/// Knobs for the schema differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffOptions {
    /// Column attributes that never count as a change.
    pub ignored_column_attributes: Vec<String>,
    /// Attach `after` hints to added and removed columns.
    pub position_hints: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignored_column_attributes: vec!["collation".to_string()],
            position_hints: true,
        }
    }
}

impl DiffOptions {
    pub fn is_ignored(&self, attribute: &str) -> bool {
        self.ignored_column_attributes.iter().any(|a| a == attribute)
    }
}

impl EngineConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(content: &str) -> ShiftResult<Self> {
        toml::from_str(content).map_err(|e| ShiftError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> ShiftResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| ShiftError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.columns.null);
        assert!(config.diff.position_hints);
        assert!(config.diff.is_ignored("collation"));
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            [columns]
            null_default = false

            [diff]
            ignored_column_attributes = ["comment"]
            "#,
        )
        .unwrap();

        assert!(!config.columns.null);
        assert!(config.diff.is_ignored("comment"));
        assert!(!config.diff.is_ignored("collation"));
        assert!(config.diff.position_hints);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EngineConfig::from_toml_str("[columns]\nnull_defualt = false\n").unwrap_err();
        assert!(matches!(err, ShiftError::Config(_)));
    }
}
