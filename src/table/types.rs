//! Column Types
//!
//! Dialect-independent abstract types plus an escape hatch for raw SQL text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ShiftError;

/// Raw SQL text that adapters pass through verbatim (never quoted).
///
/// Serialized as `{"literal": "..."}` so it stays distinguishable from a
/// plain string in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Literal {
    #[serde(rename = "literal")]
    value: String,
}

impl Literal {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Abstract column type.
///
/// Adapters map each symbolic variant onto their dialect; `Literal` is
/// emitted as-is for anything the symbolic set cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TypeRepr", into = "TypeRepr")]
pub enum ColumnType {
    String,
    Char,
    Text,
    TinyInteger,
    SmallInteger,
    Integer,
    BigInteger,
    Float,
    Decimal,
    DateTime,
    Timestamp,
    Time,
    Date,
    Binary,
    Boolean,
    Uuid,
    Json,
    Jsonb,
    /// Raw adapter-specific type text, e.g. `geometry(Point, 4326)`
    Literal(Literal),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TypeRepr {
    Name(String),
    Literal(Literal),
}

impl ColumnType {
    /// Symbolic name, or the literal text for `Literal`.
    pub fn name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Char => "char",
            Self::Text => "text",
            Self::TinyInteger => "tinyinteger",
            Self::SmallInteger => "smallinteger",
            Self::Integer => "integer",
            Self::BigInteger => "biginteger",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Time => "time",
            Self::Date => "date",
            Self::Binary => "binary",
            Self::Boolean => "boolean",
            Self::Uuid => "uuid",
            Self::Json => "json",
            Self::Jsonb => "jsonb",
            Self::Literal(literal) => literal.as_str(),
        }
    }

    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Display length used when none is given explicitly.
    pub const fn default_limit(&self) -> Option<u32> {
        match self {
            Self::String => Some(255),
            Self::TinyInteger => Some(4),
            Self::SmallInteger => Some(6),
            Self::Integer => Some(11),
            Self::BigInteger => Some(20),
            _ => None,
        }
    }

    /// Default `(precision, scale)` for exact numerics.
    pub const fn default_precision(&self) -> Option<(u32, u32)> {
        match self {
            Self::Decimal => Some((10, 6)),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Literal> for ColumnType {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

/// Parse a symbolic type name. Raw SQL must go through `Literal` instead.
impl std::str::FromStr for ColumnType {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" | "varchar" => Ok(Self::String),
            "char" => Ok(Self::Char),
            "text" => Ok(Self::Text),
            "tinyinteger" | "tinyint" => Ok(Self::TinyInteger),
            "smallinteger" | "smallint" => Ok(Self::SmallInteger),
            "integer" | "int" => Ok(Self::Integer),
            "biginteger" | "bigint" => Ok(Self::BigInteger),
            "float" | "double" => Ok(Self::Float),
            "decimal" | "numeric" => Ok(Self::Decimal),
            "datetime" => Ok(Self::DateTime),
            "timestamp" => Ok(Self::Timestamp),
            "time" => Ok(Self::Time),
            "date" => Ok(Self::Date),
            "binary" | "blob" => Ok(Self::Binary),
            "boolean" | "bool" => Ok(Self::Boolean),
            "uuid" => Ok(Self::Uuid),
            "json" => Ok(Self::Json),
            "jsonb" => Ok(Self::Jsonb),
            _ => Err(ShiftError::UnknownType(s.to_string())),
        }
    }
}

impl TryFrom<TypeRepr> for ColumnType {
    type Error = ShiftError;

    fn try_from(repr: TypeRepr) -> Result<Self, Self::Error> {
        match repr {
            TypeRepr::Name(name) => name.parse(),
            TypeRepr::Literal(literal) => Ok(Self::Literal(literal)),
        }
    }
}

impl From<ColumnType> for TypeRepr {
    fn from(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Literal(literal) => TypeRepr::Literal(literal),
            other => TypeRepr::Name(other.name().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("integer".parse::<ColumnType>().unwrap(), ColumnType::Integer);
        assert_eq!("BIGINT".parse::<ColumnType>().unwrap(), ColumnType::BigInteger);
        assert_eq!("varchar".parse::<ColumnType>().unwrap(), ColumnType::String);
        assert!(matches!(
            "geometry".parse::<ColumnType>(),
            Err(ShiftError::UnknownType(_))
        ));
    }

    #[test]
    fn test_default_limits() {
        assert_eq!(ColumnType::String.default_limit(), Some(255));
        assert_eq!(ColumnType::Integer.default_limit(), Some(11));
        assert_eq!(ColumnType::Text.default_limit(), None);
        assert_eq!(ColumnType::Decimal.default_precision(), Some((10, 6)));
    }

    #[test]
    fn test_serde_repr() {
        let json = serde_json::to_value(ColumnType::Integer).unwrap();
        assert_eq!(json, serde_json::json!("integer"));

        let literal = ColumnType::from(Literal::new("geometry(Point)"));
        let json = serde_json::to_value(&literal).unwrap();
        assert_eq!(json, serde_json::json!({ "literal": "geometry(Point)" }));

        let back: ColumnType = serde_json::from_value(json).unwrap();
        assert_eq!(back, literal);
        assert!(serde_json::from_value::<ColumnType>(serde_json::json!("nope")).is_err());
    }

    #[test]
    fn test_literal_display() {
        let literal = Literal::new("CURRENT_TIMESTAMP");
        assert_eq!(literal.to_string(), "CURRENT_TIMESTAMP");
        assert_eq!(ColumnType::from(literal).name(), "CURRENT_TIMESTAMP");
    }
}
