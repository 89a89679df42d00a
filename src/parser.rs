//! Field-spec parser using nom.
//!
//! Parses the compact column notation used when scaffolding a table.
//!
//! # Syntax Overview
//!
//! ```text
//! price:decimal?[10,2]:unique:UNIQUE_PRICE
//! ──┬── ───┬───┬──┬─── ──┬─── ─────┬──────
//!   │      │   │  │      │         │
//!   │      │   │  │      │         └── Index name (optional)
//!   │      │   │  │      └── Index type: index, unique, primary (optional)
//!   │      │   │  └── Length or [precision,scale] (optional)
//!   │      │   └── Nullable marker (optional)
//!   │      └── Column type (optional, inferred from the name)
//!   └── Field name
//! ```

use indexmap::IndexMap;
use nom::{
    IResult,
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, opt, verify},
    sequence::{delimited, pair, preceded},
};

use crate::error::{ShiftError, ShiftResult};
use crate::plan::NewTable;
use crate::table::{Column, ColumnType, Index, IndexType, Table};

const PRIMARY_KEYWORDS: &[&str] = &["primary", "primary_key"];

/// Explicit size given in brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Limit(u32),
    Precision(u32, u32),
}

/// One parsed field argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub type_name: Option<String>,
    pub nullable: bool,
    pub length: Option<Length>,
    pub index_type: Option<String>,
    pub index_name: Option<String>,
}

impl FieldSpec {
    /// Marked `primary`/`primary_key` in either the type or the index slot.
    pub fn is_primary_key(&self) -> bool {
        let is_primary = |s: &Option<String>| {
            s.as_deref()
                .is_some_and(|s| PRIMARY_KEYWORDS.contains(&s))
        };
        is_primary(&self.type_name) || is_primary(&self.index_type)
    }

    /// Resolved column type; unknown or missing types are inferred from the name.
    pub fn column_type(&self) -> ColumnType {
        let explicit = self
            .type_name
            .as_deref()
            .filter(|t| !PRIMARY_KEYWORDS.contains(t))
            .and_then(|t| t.parse::<ColumnType>().ok());
        match explicit {
            Some(column_type) => column_type,
            None => infer_type(&self.name, self.type_name.as_deref()),
        }
    }

    /// Column definition with default lengths applied.
    pub fn to_column(&self) -> Column {
        let column_type = self.column_type();
        let mut column = Column::new(self.name.clone(), column_type.clone());
        column.null = self.nullable;

        match self.length {
            Some(Length::Limit(limit)) => column.limit = Some(limit),
            Some(Length::Precision(precision, scale)) => {
                column.precision = Some(precision);
                column.scale = Some(scale);
            }
            None => {
                column.limit = column_type.default_limit();
                if let Some((precision, scale)) = column_type.default_precision() {
                    column.precision = Some(precision);
                    column.scale = Some(scale);
                }
            }
        }

        if self.is_primary_key() && column_type == ColumnType::Integer {
            column = column.identity();
        }
        column
    }

    /// Index name: explicit, or `BY_<FIELD>` / `UNIQUE_<FIELD>`.
    pub fn resolved_index_name(&self) -> String {
        match &self.index_name {
            Some(name) => name.clone(),
            None if self.index_type.as_deref() == Some("unique") => {
                format!("UNIQUE_{}", self.name).to_uppercase()
            }
            None => format!("BY_{}", self.name).to_uppercase(),
        }
    }
}

/// Parse one field argument.
pub fn parse_field(input: &str) -> ShiftResult<FieldSpec> {
    match all_consuming(field_spec)(input) {
        Ok((_, spec)) => Ok(spec),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(ShiftError::parse(
            input.len() - e.input.len(),
            format!("Invalid field spec '{}'", input),
        )),
        Err(nom::Err::Incomplete(_)) => Err(ShiftError::parse(
            input.len(),
            format!("Incomplete field spec '{}'", input),
        )),
    }
}

/// Keep only the arguments that are valid field specs.
pub fn valid_arguments<S: AsRef<str>>(args: &[S]) -> Vec<&str> {
    args.iter()
        .map(|arg| arg.as_ref())
        .filter(|arg| parse_field(arg).is_ok())
        .collect()
}

fn valid_specs<S: AsRef<str>>(args: &[S]) -> impl Iterator<Item = FieldSpec> + '_ {
    args.iter().filter_map(|arg| parse_field(arg.as_ref()).ok())
}

/// Columns keyed by field name, in argument order.
pub fn parse_fields<S: AsRef<str>>(args: &[S]) -> IndexMap<String, Column> {
    valid_specs(args)
        .map(|spec| (spec.name.clone(), spec.to_column()))
        .collect()
}

/// Indexes keyed by name. Fields sharing an index name are grouped in order;
/// primary keys and fields without an index type are skipped.
pub fn parse_indexes<S: AsRef<str>>(args: &[S]) -> IndexMap<String, Index> {
    let mut indexes: IndexMap<String, Index> = IndexMap::new();
    for spec in valid_specs(args) {
        if spec.is_primary_key() {
            continue;
        }
        let Some(index_type) = spec.index_type.as_deref() else {
            continue;
        };

        let name = spec.resolved_index_name();
        let index = indexes.entry(name.clone()).or_insert_with(|| Index {
            name: Some(name),
            index_type: if index_type == "unique" {
                IndexType::Unique
            } else {
                IndexType::Index
            },
            ..Index::default()
        });
        index.columns.push(spec.name);
    }
    indexes
}

/// Names of the fields marked as primary key.
pub fn parse_primary_key<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    valid_specs(args)
        .filter(FieldSpec::is_primary_key)
        .map(|spec| spec.name)
        .collect()
}

/// Assemble a `CREATE TABLE` plan from field arguments.
///
/// An explicit primary key disables the automatic `id` column.
pub fn new_table<S: AsRef<str>>(table: impl Into<Table>, args: &[S]) -> NewTable {
    let mut table = table.into();
    let primary_key = parse_primary_key(args);
    if !primary_key.is_empty() {
        table.options.id = false;
        table.options.primary_key = primary_key;
    }

    let mut plan = NewTable::new(table);
    for column in parse_fields(args).into_values() {
        plan.add_column(column);
    }
    for index in parse_indexes(args).into_values() {
        plan.add_index(index);
    }
    plan
}

fn infer_type(field: &str, type_name: Option<&str>) -> ColumnType {
    if type_name.is_some_and(|t| PRIMARY_KEYWORDS.contains(&t)) || field == "id" {
        ColumnType::Integer
    } else if ["created", "modified", "updated"].contains(&field) || field.ends_with("_at") {
        ColumnType::DateTime
    } else if ["latitude", "longitude", "lat", "lng"].contains(&field) {
        ColumnType::Decimal
    } else {
        ColumnType::String
    }
}

/// Parse a complete field spec.
fn field_spec(input: &str) -> IResult<&str, FieldSpec> {
    let (input, name) = parse_word(input)?;
    let (input, column_type) = opt(preceded(char(':'), parse_type))(input)?;
    let (input, index_type) = opt(preceded(char(':'), parse_word))(input)?;
    let (input, index_name) = opt(preceded(char(':'), parse_word))(input)?;

    let (type_name, nullable, length) = match column_type {
        Some((type_name, nullable, length)) => (Some(type_name.to_string()), nullable, length),
        None => (None, false, None),
    };

    Ok((
        input,
        FieldSpec {
            name: name.to_string(),
            type_name,
            nullable,
            length,
            index_type: index_type.map(str::to_string),
            index_name: index_name.map(str::to_string),
        },
    ))
}

/// Word characters, like a regex `\w+`.
fn parse_word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// `type`, `type?`, `type[len]`, `type?[precision,scale]`
fn parse_type(input: &str) -> IResult<&str, (&str, bool, Option<Length>)> {
    let (input, type_name) = parse_word(input)?;
    let (input, nullable) = opt(char('?'))(input)?;
    let (input, length) = opt(delimited(
        char('['),
        pair(parse_number, opt(preceded(char(','), parse_number))),
        char(']'),
    ))(input)?;

    let length = length.map(|(first, second)| match second {
        Some(scale) => Length::Precision(first, scale),
        None => Length::Limit(first),
    });
    Ok((input, (type_name, nullable.is_some(), length)))
}

/// Decimal without leading zeros.
fn parse_number(input: &str) -> IResult<&str, u32> {
    map_res(
        verify(digit1, |digits: &str| digits.len() == 1 || !digits.starts_with('0')),
        str::parse::<u32>,
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_full() {
        let spec = parse_field("price:decimal?[10,2]:unique:UNIQUE_PRICE").unwrap();
        assert_eq!(spec.name, "price");
        assert_eq!(spec.type_name.as_deref(), Some("decimal"));
        assert!(spec.nullable);
        assert_eq!(spec.length, Some(Length::Precision(10, 2)));
        assert_eq!(spec.index_type.as_deref(), Some("unique"));
        assert_eq!(spec.index_name.as_deref(), Some("UNIQUE_PRICE"));
    }

    #[test]
    fn test_parse_field_errors() {
        assert!(parse_field("").is_err());
        assert!(parse_field("name:string[01]").is_err());
        assert!(parse_field("a:b:c:d:e").is_err());

        let err = parse_field("title:string[").unwrap_err();
        assert!(matches!(err, ShiftError::Parse { .. }));
    }

    #[test]
    fn test_valid_arguments() {
        assert_eq!(valid_arguments(&["id", "id"]), vec!["id", "id"]);
        assert_eq!(
            valid_arguments(&["id:primary_key:primary", "bad-name", "field:fieldType:indexType:indexName"]),
            vec!["id:primary_key:primary", "field:fieldType:indexType:indexName"]
        );
    }

    #[test]
    fn test_parse_fields_defaults() {
        let fields = parse_fields(&["id", "name", "created", "lat", "body:text?"]);
        assert_eq!(
            fields.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["id", "name", "created", "lat", "body"]
        );

        assert_eq!(fields["id"].column_type, Some(ColumnType::Integer));
        assert_eq!(fields["id"].limit, Some(11));
        assert!(!fields["id"].null);
        assert!(!fields["id"].identity);

        assert_eq!(fields["name"].column_type, Some(ColumnType::String));
        assert_eq!(fields["name"].limit, Some(255));

        assert_eq!(fields["created"].column_type, Some(ColumnType::DateTime));
        assert_eq!(fields["created"].limit, None);

        assert_eq!(fields["lat"].precision, Some(10));
        assert_eq!(fields["lat"].scale, Some(6));

        assert!(fields["body"].null);
        assert_eq!(fields["body"].column_type, Some(ColumnType::Text));
    }

    #[test]
    fn test_parse_fields_types() {
        let fields = parse_fields(&["id:primary", "token:uuid", "shape:polygon", "code:string[3]"]);
        assert!(fields["id"].identity);
        assert_eq!(fields["id"].column_type, Some(ColumnType::Integer));
        assert_eq!(fields["token"].column_type, Some(ColumnType::Uuid));
        assert_eq!(fields["shape"].column_type, Some(ColumnType::String));
        assert_eq!(fields["code"].limit, Some(3));
    }

    #[test]
    fn test_parse_indexes() {
        let indexes = parse_indexes(&[
            "id:primary_key",
            "some_field",
            "slug:string:index",
            "email:string:unique",
            "event_id:integer:unique:UNIQUE_EVENT",
            "market_id:integer:unique:UNIQUE_EVENT",
        ]);

        assert_eq!(
            indexes.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["BY_SLUG", "UNIQUE_EMAIL", "UNIQUE_EVENT"]
        );
        assert!(!indexes["BY_SLUG"].is_unique());
        assert!(indexes["UNIQUE_EMAIL"].is_unique());
        assert_eq!(indexes["UNIQUE_EVENT"].columns, vec!["event_id", "market_id"]);
    }

    #[test]
    fn test_parse_primary_key() {
        assert_eq!(
            parse_primary_key(&["id:integer:primary", "site:primary_key", "name"]),
            vec!["id", "site"]
        );
    }

    #[test]
    fn test_new_table() {
        let plan = new_table("tags", &["id:primary", "name:string:unique"]);
        assert!(!plan.table().options.id);
        assert_eq!(plan.table().options.primary_key, vec!["id"]);
        assert_eq!(plan.column_names(), vec!["id", "name"]);
        assert_eq!(plan.indexes()[0].name.as_deref(), Some("UNIQUE_NAME"));

        let plan = new_table("notes", &["body:text"]);
        assert!(plan.table().options.id);
    }
}
