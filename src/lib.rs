//! Lightweight MySQL access layer
//!
//! Turns structured descriptions of schema and query intent into
//! parameterized SQL, runs it through a pooled or transactional connection,
//! and returns role-specific results (an insert id, a changed-row count, a
//! row list, a boolean for guarded DDL).

pub mod builder;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::{Config, MysqlOptions};
pub use db::{Connection, ConnectionState, Mysql};
pub use error::{MysqlError, MysqlResult};
pub use models::{
    Assignment, ColumnSpec, DatabaseOptions, Done, Execution, Find, Row, TableOptions, Value,
};
