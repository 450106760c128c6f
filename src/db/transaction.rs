//! Transaction coordination.
//!
//! A transaction reserves one connection for its whole duration:
//!
//! ```text
//! acquire -> START TRANSACTION -> callback -> COMMIT   -> release
//!                 |                   |          | fails
//!                 | fails             | fails    v
//!                 v                   +------> ROLLBACK -> release
//!              release
//! ```
//!
//! The connection is released exactly once on every path. When ROLLBACK
//! itself fails, its error is returned in place of the callback's.

use crate::db::connection::Connection;
use crate::db::pool::Mysql;
use crate::error::MysqlError;
use futures_util::future::BoxFuture;
use tracing::{debug, info, warn};
use uuid::Uuid;

impl Mysql {
    /// Run `callback` inside a transaction on a dedicated connection.
    ///
    /// The callback's value is returned after COMMIT. A callback error (or a
    /// failed COMMIT) triggers ROLLBACK and is returned unchanged. If
    /// START TRANSACTION fails the callback never runs.
    ///
    /// Calling `transaction` again from inside the callback opens a separate
    /// transaction on another connection; nesting is not supported.
    ///
    /// ```ignore
    /// let id = db
    ///     .transaction(|conn| {
    ///         Box::pin(async move {
    ///             let id = conn.insert("users", &[("username", "bob".into())]).await?;
    ///             conn.insert("audit", &[("user_id", id.into())]).await?;
    ///             Ok::<_, MysqlError>(id)
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn transaction<T, E, F>(&self, callback: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut Connection) -> BoxFuture<'c, Result<T, E>>,
        E: From<MysqlError>,
    {
        let transaction_id = format!("tx_{}", Uuid::new_v4().simple());
        let mut conn = self.get_connection().await?;

        if let Err(e) = conn.begin_transaction().await {
            warn!(transaction_id = %transaction_id, error = %e, "Failed to begin transaction");
            conn.release();
            return Err(e.into());
        }
        debug!(transaction_id = %transaction_id, "Transaction started");

        let result = match callback(&mut conn).await {
            Ok(value) => match conn.commit().await {
                Ok(()) => {
                    info!(transaction_id = %transaction_id, "Transaction committed");
                    Ok(value)
                }
                Err(commit_err) => {
                    warn!(transaction_id = %transaction_id, error = %commit_err, "Commit failed, rolling back");
                    match conn.rollback().await {
                        Ok(()) => Err(commit_err.into()),
                        Err(rollback_err) => {
                            warn!(transaction_id = %transaction_id, error = %rollback_err, "Rollback failed");
                            Err(rollback_err.into())
                        }
                    }
                }
            },
            Err(err) => match conn.rollback().await {
                Ok(()) => {
                    info!(transaction_id = %transaction_id, "Transaction rolled back");
                    Err(err)
                }
                Err(rollback_err) => {
                    warn!(transaction_id = %transaction_id, error = %rollback_err, "Rollback failed");
                    Err(rollback_err.into())
                }
            },
        };

        self.remember(&conn);
        conn.release();
        result
    }
}
