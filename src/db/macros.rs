//! Pooled-operation macro.
//!
//! Every data and schema operation on [`Mysql`](crate::db::Mysql) follows the
//! same acquire-use-remember-release sequence. The macro expands it in place
//! so each operation stays a one-liner.

/// Run `$call` on a freshly acquired connection, then release it.
///
/// The connection is released whether `$call` succeeds or fails; its last
/// execution is copied into the pool's debug snapshot first.
///
/// # Example
///
/// ```ignore
/// on_pooled_connection!(self, |conn| conn.count(table, find))
/// ```
macro_rules! on_pooled_connection {
    ($db:expr, |$conn:ident| $call:expr) => {{
        let db = $db;
        let mut $conn = db.get_connection().await?;
        let result = $call.await;
        db.remember(&$conn);
        $conn.release();
        result
    }};
}
