//! Column/index compilation and DDL statements.
//!
//! Generated text follows MySQL conventions: backtick-quoted identifiers and
//! `IF [NOT] EXISTS` guards so every statement is idempotent.

use super::quote_ident;
use crate::models::{
    ColumnSpec, DatabaseOptions, Length, LengthPart, Statement, TableOptions, value::quote_literal,
};

pub const UNIQUE_KEYWORD: &str = "UNIQUE KEY";
pub const INDEX_KEYWORD: &str = "INDEX";

/// Compile one column definition.
///
/// Primary-key columns are pushed onto `primary_keys` so the caller can emit
/// a single trailing `PRIMARY KEY (...)` clause.
pub fn compile_column(name: &str, spec: &ColumnSpec, primary_keys: &mut Vec<String>) -> String {
    let mut sql = format!("  {} {}", quote_ident(name), spec.type_name_or_default());

    if let Some(length) = &spec.length {
        sql.push_str(&format!(" ({})", compile_length(length)));
    }
    if spec.unsigned {
        sql.push_str(" unsigned");
    }
    if let Some(collate) = &spec.collate {
        sql.push_str(&format!(" COLLATE {}", collate));
    }
    if spec.required || spec.primary {
        sql.push_str(" NOT NULL");
    } else {
        sql.push_str(" NULL");
    }
    if !spec.increment {
        if let Some(default) = &spec.default {
            sql.push_str(&format!(" DEFAULT {}", default.to_sql_literal()));
        }
    }
    if spec.increment {
        sql.push_str(" AUTO_INCREMENT");
    }

    if spec.primary {
        primary_keys.push(name.to_string());
    }

    sql
}

fn compile_length(length: &Length) -> String {
    match length {
        Length::Scalar(text) => text.clone(),
        Length::List(parts) => parts
            .iter()
            .map(|part| match part {
                LengthPart::Number(n) => n.to_string(),
                LengthPart::Text(s) => quote_literal(s),
            })
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Split `"col DESC"` into the column and its direction (default `ASC`).
fn split_index_column(reference: &str) -> (&str, &str) {
    let mut parts = reference.split_whitespace();
    let column = parts.next().unwrap_or(reference);
    let direction = match parts.next() {
        Some(dir) if dir.eq_ignore_ascii_case("desc") => "DESC",
        _ => "ASC",
    };
    (column, direction)
}

/// Compile a group of named indexes sharing one keyword.
///
/// Returns `(index name, fragment)` pairs in input order.
pub fn compile_index_group(keyword: &str, indexes: &[(String, Vec<String>)]) -> Vec<(String, String)> {
    indexes
        .iter()
        .map(|(name, columns)| {
            let cols = columns
                .iter()
                .map(|reference| {
                    let (column, direction) = split_index_column(reference);
                    format!("{} {}", quote_ident(column), direction)
                })
                .collect::<Vec<_>>()
                .join(", ");
            let fragment = format!("  {} {} ({})", keyword, quote_ident(name), cols);
            (name.clone(), fragment)
        })
        .collect()
}

/// `db`.`table` when a database is given, otherwise `table`.
fn qualified(database: Option<&str>, table: &str) -> String {
    match database {
        Some(db) if !db.is_empty() => format!("{}.{}", quote_ident(db), quote_ident(table)),
        _ => quote_ident(table),
    }
}

pub fn create_database(name: &str, options: &DatabaseOptions) -> Statement {
    Statement::definition(format!(
        "CREATE DATABASE IF NOT EXISTS {} DEFAULT CHARACTER SET {} COLLATE {}",
        quote_ident(name),
        options.charset_or_default(),
        options.collate_or_default()
    ))
}

pub fn drop_database(name: &str) -> Statement {
    Statement::definition(format!("DROP DATABASE IF EXISTS {}", quote_ident(name)))
}

/// Build `CREATE TABLE IF NOT EXISTS`.
///
/// Clause order: columns, primary key, plain indexes, unique keys, then the
/// table options. `AUTO_INCREMENT=n` is only emitted when a seed is given.
pub fn create_table(
    database: Option<&str>,
    name: &str,
    columns: &[(&str, ColumnSpec)],
    options: &TableOptions,
) -> Statement {
    let mut primary_keys = Vec::new();
    let mut definitions: Vec<String> = columns
        .iter()
        .map(|(column, spec)| compile_column(column, spec, &mut primary_keys))
        .collect();

    if !primary_keys.is_empty() {
        let keys = primary_keys
            .iter()
            .map(|k| quote_ident(k))
            .collect::<Vec<_>>()
            .join(", ");
        definitions.push(format!("  PRIMARY KEY ({})", keys));
    }

    definitions.extend(
        compile_index_group(INDEX_KEYWORD, &options.index)
            .into_iter()
            .map(|(_, fragment)| fragment),
    );
    definitions.extend(
        compile_index_group(UNIQUE_KEYWORD, &options.unique)
            .into_iter()
            .map(|(_, fragment)| fragment),
    );

    let increment = options
        .increment
        .map(|seed| format!(" AUTO_INCREMENT={}", seed))
        .unwrap_or_default();

    Statement::definition(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n) ENGINE={}{} CHARSET={} COLLATE={}",
        qualified(database, name),
        definitions.join(",\n"),
        options.engine_or_default(),
        increment,
        options.charset_or_default(),
        options.collate_or_default()
    ))
}

/// Build `DROP TABLE IF EXISTS` for one or more tables.
pub fn drop_table(database: Option<&str>, names: &[&str]) -> Statement {
    let tables = names
        .iter()
        .map(|name| qualified(database, name))
        .collect::<Vec<_>>()
        .join(", ");
    Statement::definition(format!("DROP TABLE IF EXISTS {}", tables))
}
