//! Parameter binding for MySQL queries.

use crate::models::Value;
use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::types::Json;

/// Bind a value to a MySQL query.
pub(crate) fn bind_value<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::UInt(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::String(v) => query.bind(v.as_str()),
        Value::Json(v) => query.bind(Json(v)),
    }
}

/// Build a query with every value bound in order.
pub(crate) fn bind_all<'q>(
    sql: &'q str,
    values: &'q [Value],
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    values
        .iter()
        .fold(sqlx::query(sql), |query, value| bind_value(query, value))
}
