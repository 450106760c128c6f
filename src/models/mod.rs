//! Data models for the MySQL access layer.
//!
//! This module re-exports all model types used throughout the crate.

pub mod query;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use query::{
    Assignment, Done, Execution, Field, Find, Outcome, Row, RowSet, Statement, StatementKind,
};
pub use schema::{
    ColumnSpec, DEFAULT_CHARSET, DEFAULT_COLLATE, DEFAULT_COLUMN_TYPE, DEFAULT_ENGINE,
    DatabaseOptions, IndexMap, Length, LengthPart, TableOptions,
};
pub use value::Value;
