//! Statement execution on a single connection.
//!
//! The executor dispatches a built statement and normalizes the driver result:
//! - row-producing statements yield a [`RowSet`] (rows plus field descriptors)
//! - mutations yield [`Done`] (insert id, affected rows)
//! - DDL yields whether an object was created or dropped
//!
//! Result shape follows the statement kind chosen by the builder rather than
//! field metadata, because an empty MySQL result carries no columns.

use crate::db::params::bind_all;
use crate::db::types::{DecodeOptions, row_fields, row_to_json};
use crate::error::{MysqlError, MysqlResult, codes};
use crate::models::{Done, Outcome, RowSet, Statement, StatementKind, Value};
use serde_json::Value as JsonValue;
use sqlx::{Executor, MySqlConnection};
use std::time::Instant;
use tracing::debug;

/// Server notes meaning a guarded DDL statement was a no-op.
const NOOP_DDL_CODES: [u16; 4] = [
    codes::ER_DB_CREATE_EXISTS,
    codes::ER_DB_DROP_EXISTS,
    codes::ER_TABLE_EXISTS_ERROR,
    codes::ER_BAD_TABLE_ERROR,
];

/// Run a row-producing statement.
pub async fn fetch(
    conn: &mut MySqlConnection,
    sql: &str,
    values: &[Value],
    decode: DecodeOptions,
) -> MysqlResult<RowSet> {
    let start = Instant::now();
    debug!(sql = %sql, params = values.len(), "Executing query");

    // When there are no values, use raw SQL to avoid prepared statement issues
    let rows = if values.is_empty() {
        (&mut *conn).fetch_all(sql).await?
    } else {
        bind_all(sql, values).fetch_all(&mut *conn).await?
    };

    debug!(
        rows = rows.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Query complete"
    );

    let fields = rows.first().map(row_fields).unwrap_or_default();
    let rows = rows.iter().map(|row| row_to_json(row, decode)).collect();
    Ok(RowSet { rows, fields })
}

/// Run a statement that returns no rows.
pub async fn execute(
    conn: &mut MySqlConnection,
    sql: &str,
    values: &[Value],
) -> MysqlResult<Done> {
    let start = Instant::now();
    debug!(sql = %sql, params = values.len(), "Executing statement");

    let result = if values.is_empty() {
        (&mut *conn).execute(sql).await?
    } else {
        bind_all(sql, values).execute(&mut *conn).await?
    };

    debug!(
        rows_affected = result.rows_affected(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Statement complete"
    );

    Ok(Done {
        insert_id: result.last_insert_id(),
        field_count: 0,
        affected_rows: result.rows_affected(),
        changed_rows: None,
    })
}

/// Run a statement according to its kind.
pub async fn run(
    conn: &mut MySqlConnection,
    statement: &Statement,
    decode: DecodeOptions,
) -> MysqlResult<Outcome> {
    match statement.kind {
        StatementKind::Rows => fetch(conn, &statement.sql, &statement.values, decode)
            .await
            .map(Outcome::Rows),
        StatementKind::Mutation | StatementKind::Definition => {
            execute(conn, &statement.sql, &statement.values)
                .await
                .map(Outcome::Done)
        }
    }
}

/// Run a guarded DDL statement and report whether it did anything.
///
/// `IF [NOT] EXISTS` statements succeed either way; the server leaves a note
/// (1007, 1008, 1050 or 1051) when the object already existed or was missing.
/// The notes are read back on the same connection.
pub async fn execute_definition(
    conn: &mut MySqlConnection,
    sql: &str,
) -> MysqlResult<(Done, bool)> {
    let done = execute(conn, sql, &[]).await?;
    let warnings = fetch(conn, "SHOW WARNINGS", &[], DecodeOptions::default()).await?;

    let noop = warnings.rows.iter().any(|row| {
        row.get("Code")
            .and_then(as_u64)
            .is_some_and(|code| NOOP_DDL_CODES.iter().any(|&c| u64::from(c) == code))
    });
    Ok((done, !noop))
}

fn as_u64(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Bool(b) => Some(u64::from(*b)),
        _ => None,
    }
}

/// The sole scalar of a single-value query as an integer.
pub fn scalar_u64(rows: &RowSet) -> MysqlResult<u64> {
    rows.first_scalar()
        .and_then(as_u64)
        .ok_or_else(|| MysqlError::decode("Expected a single numeric value in the result"))
}

/// The sole scalar of a single-value query as a boolean.
pub fn scalar_bool(rows: &RowSet) -> MysqlResult<bool> {
    scalar_u64(rows).map(|v| v != 0)
}
