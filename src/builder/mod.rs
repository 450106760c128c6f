//! SQL statement synthesis.
//!
//! Builders are pure: they turn structured descriptions into a
//! [`Statement`](crate::models::Statement) (SQL text plus ordered values) and
//! never touch a connection. Nothing is validated here; malformed input
//! surfaces as a server error when the statement runs.
//!
//! - `clause`: find-fragment normalization (WHERE / ORDER BY / LIMIT / GROUP BY)
//! - `ddl`: column and index compilation, CREATE/DROP DATABASE and TABLE
//! - `dml`: INSERT, SELECT, EXISTS, COUNT, UPDATE, DELETE

pub mod clause;
pub mod ddl;
pub mod dml;

pub use clause::normalize;

/// Backtick-quote an identifier, doubling embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a column reference for a select list; `*` passes through.
pub(crate) fn quote_column(name: &str) -> String {
    if name == "*" {
        name.to_string()
    } else {
        quote_ident(name)
    }
}
