//! Data-manipulation statements.
//!
//! Table names are emitted verbatim so callers may pass `db.table` or an
//! already-quoted name; column names are backtick-quoted.

use super::{normalize, quote_column, quote_ident};
use crate::models::{Assignment, Find, Statement, Value};

fn column_list(columns: &[&str]) -> String {
    if columns.is_empty() {
        return "*".to_string();
    }
    columns
        .iter()
        .map(|c| quote_column(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `INSERT INTO t (`a`, `b`) VALUES (?, ?)` with values in column order.
pub fn insert(table: &str, data: &[(&str, Value)]) -> Statement {
    let columns = data
        .iter()
        .map(|(name, _)| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; data.len()].join(", ");
    let values = data.iter().map(|(_, v)| v.clone()).collect();

    Statement::mutation(
        format!("INSERT INTO {} ({}) VALUES ({})", table, columns, placeholders),
        values,
    )
}

/// `SELECT cols FROM t{find}`. An empty column list selects `*`.
pub fn select(table: &str, columns: &[&str], find: &Find) -> Statement {
    Statement::rows(
        format!(
            "SELECT {} FROM {}{}",
            column_list(columns),
            table,
            normalize(find.clause())
        ),
        find.values.clone(),
    )
}

/// Same as [`select`] with a forced ` LIMIT 1`.
pub fn select_one(table: &str, columns: &[&str], find: &Find) -> Statement {
    let mut stmt = select(table, columns, find);
    stmt.sql.push_str(" LIMIT 1");
    stmt
}

pub fn exists(table: &str, find: &Find) -> Statement {
    Statement::rows(
        format!(
            "SELECT EXISTS(SELECT 1 FROM {}{} LIMIT 1)",
            table,
            normalize(find.clause())
        ),
        find.values.clone(),
    )
}

pub fn count(table: &str, find: &Find) -> Statement {
    Statement::rows(
        format!("SELECT COUNT(1) FROM {}{}", table, normalize(find.clause())),
        find.values.clone(),
    )
}

/// `col = ?` or `col = <expression>` right-hand sides, in assignment order.
fn set_targets(assignment: &Assignment) -> Vec<(&str, &str)> {
    match assignment {
        Assignment::Bound(pairs) => pairs.iter().map(|(column, _)| (column.as_str(), "?")).collect(),
        Assignment::Arithmetic { expressions, .. } => expressions
            .iter()
            .map(|(column, expr)| (column.as_str(), expr.as_str()))
            .collect(),
    }
}

/// `UPDATE t SET ...{find}`.
///
/// Parameters are the assignment's values followed by the find values.
pub fn update(table: &str, assignment: &Assignment, find: &Find) -> Statement {
    let mut values = assignment.values();
    values.extend(find.values.iter().cloned());

    let set = set_targets(assignment)
        .into_iter()
        .map(|(column, expr)| format!("{} = {}", quote_ident(column), expr))
        .collect::<Vec<_>>()
        .join(", ");

    Statement::mutation(
        format!("UPDATE {} SET {}{}", table, set, normalize(find.clause())),
        values,
    )
}

/// Count of rows the matching [`update`] would actually change.
///
/// The server reports matched rows for UPDATE, so changed rows are counted
/// up front: rows selected by `find` whose current value differs from what
/// the assignment would write. Values are compared as bytes, so a case-only
/// change under a `_ci` collation counts as a change. The matched rows are
/// read with `FOR UPDATE`, which holds them until the enclosing transaction
/// ends. Run it on the same connection, right before the update.
pub fn count_changed(table: &str, assignment: &Assignment, find: &Find) -> Statement {
    let mut values = find.values.clone();
    values.extend(assignment.values());

    let unchanged = set_targets(assignment)
        .into_iter()
        .map(|(column, expr)| {
            format!(
                "CAST({} AS BINARY) <=> CAST({} AS BINARY)",
                quote_ident(column),
                expr
            )
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    Statement::rows(
        format!(
            "SELECT COUNT(1) FROM (SELECT * FROM {}{} FOR UPDATE) AS `matched` WHERE NOT ({})",
            table,
            normalize(find.clause()),
            unchanged
        ),
        values,
    )
}

/// `DELETE FROM t{find}`.
pub fn delete(table: &str, find: &Find) -> Statement {
    Statement::mutation(
        format!("DELETE FROM {}{}", table, normalize(find.clause())),
        find.values.clone(),
    )
}
