//! Schema definition models.
//!
//! These types describe tables the way callers write them: an ordered list of
//! named column specifications plus named index groups. The DDL builder turns
//! them into `CREATE TABLE` text.

use super::value::Value;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_COLUMN_TYPE: &str = "int";
pub const DEFAULT_ENGINE: &str = "InnoDB";
pub const DEFAULT_CHARSET: &str = "utf8mb4";
pub const DEFAULT_COLLATE: &str = "utf8mb4_unicode_ci";

/// One element of a column length list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LengthPart {
    Number(u64),
    /// Quoted in DDL, used for ENUM/SET members.
    Text(String),
}

impl From<u64> for LengthPart {
    fn from(v: u64) -> Self {
        Self::Number(v)
    }
}

impl From<u32> for LengthPart {
    fn from(v: u32) -> Self {
        Self::Number(v as u64)
    }
}

impl From<i32> for LengthPart {
    fn from(v: i32) -> Self {
        Self::Number(v.max(0) as u64)
    }
}

impl From<&str> for LengthPart {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Column length: `(255)`, `(11, 2)` or `('a', 'b')`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Length {
    /// Inserted verbatim, e.g. `255` or `"11,2"`.
    Scalar(String),
    List(Vec<LengthPart>),
}

impl From<u64> for Length {
    fn from(v: u64) -> Self {
        Self::Scalar(v.to_string())
    }
}

impl From<u32> for Length {
    fn from(v: u32) -> Self {
        Self::Scalar(v.to_string())
    }
}

impl From<i32> for Length {
    fn from(v: i32) -> Self {
        Self::Scalar(v.to_string())
    }
}

impl From<&str> for Length {
    fn from(v: &str) -> Self {
        Self::Scalar(v.to_string())
    }
}

impl<T: Into<LengthPart>> From<Vec<T>> for Length {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// Specification for a single column.
///
/// `default` distinguishes absent (`None`) from an explicit SQL NULL
/// (`Some(Value::Null)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    /// SQL type name (default: `int`)
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub length: Option<Length>,
    pub unsigned: bool,
    pub collate: Option<String>,
    /// Forces NOT NULL
    pub required: bool,
    #[serde(
        deserialize_with = "present_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
    /// AUTO_INCREMENT; suppresses `default`
    pub increment: bool,
    /// Adds the column to the table's primary key
    pub primary: bool,
}

impl ColumnSpec {
    /// A column of the given SQL type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    pub fn length(mut self, length: impl Into<Length>) -> Self {
        self.length = Some(length.into());
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn increment(mut self) -> Self {
        self.increment = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Effective SQL type name.
    pub fn type_name_or_default(&self) -> &str {
        self.type_name.as_deref().unwrap_or(DEFAULT_COLUMN_TYPE)
    }
}

/// A present `default` key, `null` included, is `Some`; only a missing key
/// stays `None`.
fn present_default<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Ordered map of index name to column references (`"col"` or `"col DESC"`).
pub type IndexMap = Vec<(String, Vec<String>)>;

/// Table-level options for `CREATE TABLE`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub unique: IndexMap,
    pub index: IndexMap,
    /// Storage engine (default: InnoDB)
    pub engine: Option<String>,
    /// AUTO_INCREMENT seed; omitted from the statement when unset
    pub increment: Option<u64>,
    /// Default: utf8mb4
    pub charset: Option<String>,
    /// Default: utf8mb4_unicode_ci
    pub collate: Option<String>,
}

impl TableOptions {
    pub fn unique<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique
            .push((name.into(), columns.into_iter().map(Into::into).collect()));
        self
    }

    pub fn index<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index
            .push((name.into(), columns.into_iter().map(Into::into).collect()));
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn auto_increment(mut self, seed: u64) -> Self {
        self.increment = Some(seed);
        self
    }

    pub fn engine_or_default(&self) -> &str {
        self.engine.as_deref().unwrap_or(DEFAULT_ENGINE)
    }

    pub fn charset_or_default(&self) -> &str {
        self.charset.as_deref().unwrap_or(DEFAULT_CHARSET)
    }

    pub fn collate_or_default(&self) -> &str {
        self.collate.as_deref().unwrap_or(DEFAULT_COLLATE)
    }
}

/// Options for `CREATE DATABASE`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    pub charset: Option<String>,
    pub collate: Option<String>,
}

impl DatabaseOptions {
    pub fn charset_or_default(&self) -> &str {
        self.charset.as_deref().unwrap_or(DEFAULT_CHARSET)
    }

    pub fn collate_or_default(&self) -> &str {
        self.collate.as_deref().unwrap_or(DEFAULT_COLLATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_spec_defaults() {
        let spec = ColumnSpec::default();
        assert_eq!(spec.type_name_or_default(), "int");
        assert!(spec.default.is_none());
        assert!(!spec.primary);
    }

    #[test]
    fn test_column_spec_from_json() {
        let spec: ColumnSpec = serde_json::from_str(
            r#"{"type": "decimal", "length": [11, 2], "required": true, "default": null}"#,
        )
        .unwrap();
        assert_eq!(spec.type_name.as_deref(), Some("decimal"));
        assert_eq!(
            spec.length,
            Some(Length::List(vec![LengthPart::Number(11), LengthPart::Number(2)]))
        );
        assert!(spec.required);
        assert_eq!(spec.default, Some(Value::Null));

        let absent: ColumnSpec = serde_json::from_str(r#"{"type": "text"}"#).unwrap();
        assert_eq!(absent.default, None);
    }

    #[test]
    fn test_table_options_defaults() {
        let opts = TableOptions::default();
        assert_eq!(opts.engine_or_default(), "InnoDB");
        assert_eq!(opts.increment, None);
        assert_eq!(opts.charset_or_default(), "utf8mb4");
        assert_eq!(opts.collate_or_default(), "utf8mb4_unicode_ci");
    }

    #[test]
    fn test_table_options_builders_keep_order() {
        let opts = TableOptions::default()
            .unique("email", ["email"])
            .index("by_name", ["last DESC", "first"]);
        assert_eq!(opts.unique[0].0, "email");
        assert_eq!(opts.index[0].1, vec!["last DESC", "first"]);
    }
}
