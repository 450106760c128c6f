//! Query-related data models.
//!
//! This module defines the caller-facing query inputs (find fragments,
//! update assignments), the built statement handed to the executor, and the
//! normalized results it returns.

use super::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A decoded result row, keyed by column name.
pub type Row = serde_json::Map<String, JsonValue>;

/// Caller-supplied clause plus its bound values.
///
/// The clause is either a condition (`"id = ?"`, compiled behind ` WHERE `)
/// or a trailing clause starting with `ORDER BY`, `LIMIT` or `GROUP BY`.
/// `values` must match the clause's `?` placeholders one for one; a mismatch
/// surfaces as a server error when the statement runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Find {
    pub clause: Option<String>,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl Find {
    /// No clause: every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(clause: impl Into<String>) -> Self {
        Self {
            clause: Some(clause.into()),
            values: Vec::new(),
        }
    }

    /// Append a bound value.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// The clause text, with empty strings treated as absent.
    pub fn clause(&self) -> Option<&str> {
        self.clause.as_deref().filter(|c| !c.is_empty())
    }
}

impl From<&str> for Find {
    fn from(clause: &str) -> Self {
        Self::new(clause)
    }
}

impl From<String> for Find {
    fn from(clause: String) -> Self {
        Self::new(clause)
    }
}

/// Right-hand side of an `UPDATE ... SET`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    /// `col = ?` for every column.
    Bound(Vec<(String, Value)>),
    /// `col = <expression>` with literal SQL expressions. `values` feed the
    /// expressions' own placeholders and are bound ahead of the find values.
    Arithmetic {
        expressions: Vec<(String, String)>,
        values: Vec<Value>,
    },
}

impl Assignment {
    pub fn bound<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Bound(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn arithmetic<I, K, E, V>(expressions: I, values: V) -> Self
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: Into<String>,
        V: IntoIterator,
        V::Item: Into<Value>,
    {
        Self::Arithmetic {
            expressions: expressions
                .into_iter()
                .map(|(k, e)| (k.into(), e.into()))
                .collect(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Values bound by the SET list, in placeholder order.
    pub fn values(&self) -> Vec<Value> {
        match self {
            Self::Bound(pairs) => pairs.iter().map(|(_, v)| v.clone()).collect(),
            Self::Arithmetic { values, .. } => values.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bound(pairs) => pairs.is_empty(),
            Self::Arithmetic { expressions, .. } => expressions.is_empty(),
        }
    }
}

/// What kind of result a statement produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Returns a row set.
    Rows,
    /// Returns insert id / affected rows.
    Mutation,
    /// DDL whose "already exists"/"unknown" note decides the boolean outcome.
    Definition,
}

/// A fully built statement: SQL text plus its ordered parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<Value>,
    pub kind: StatementKind,
}

impl Statement {
    pub fn rows(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
            kind: StatementKind::Rows,
        }
    }

    pub fn mutation(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
            kind: StatementKind::Mutation,
        }
    }

    pub fn definition(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            values: Vec::new(),
            kind: StatementKind::Definition,
        }
    }
}

/// Column descriptor for a row set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// MySQL type name (e.g. "INT", "VARCHAR")
    pub type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    pub rows: Vec<Row>,
    pub fields: Vec<Field>,
}

impl RowSet {
    /// Sole scalar of the first row, looked up by the first field's name.
    pub fn first_scalar(&self) -> Option<&JsonValue> {
        let field = self.fields.first()?;
        self.rows.first()?.get(&field.name)
    }
}

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Done {
    pub insert_id: u64,
    pub field_count: u64,
    pub affected_rows: u64,
    /// Only set for UPDATE, where matched and changed rows differ.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_rows: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Outcome {
    Rows(RowSet),
    Done(Done),
}

/// Snapshot of the most recent statement run through a pool or connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub sql: String,
    pub values: Vec<Value>,
    pub outcome: Option<Outcome>,
}
