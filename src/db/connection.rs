//! A reserved pool connection.
//!
//! [`Connection`] owns one physical connection between acquisition and
//! release and exposes the full operation set on it. Operations issued on the
//! same connection run in order, which is what makes it usable as a
//! transaction context.

use crate::builder::{ddl, dml};
use crate::config::MysqlOptions;
use crate::db::executor::{self, scalar_bool, scalar_u64};
use crate::db::types::DecodeOptions;
use crate::error::{MysqlError, MysqlResult};
use crate::models::{
    Assignment, ColumnSpec, DatabaseOptions, Done, Execution, Find, Outcome, Row, RowSet,
    Statement, TableOptions, Value,
};
use sqlx::pool::PoolConnection;
use sqlx::{MySql, MySqlConnection};
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle of a reserved connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Acquired,
    InTransaction,
    Destroyed,
}

pub struct Connection {
    inner: Option<PoolConnection<MySql>>,
    options: Arc<MysqlOptions>,
    state: ConnectionState,
    last: Option<Execution>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub(crate) fn new(inner: PoolConnection<MySql>, options: Arc<MysqlOptions>) -> Self {
        Self {
            inner: Some(inner),
            options,
            state: ConnectionState::Acquired,
            last: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The most recent statement run on this connection.
    pub fn last_execution(&self) -> Option<&Execution> {
        self.last.as_ref()
    }

    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::from(self.options.as_ref())
    }

    fn raw(&mut self) -> MysqlResult<&mut MySqlConnection> {
        self.inner
            .as_deref_mut()
            .ok_or(MysqlError::ConnectionDestroyed)
    }

    /// Dispatch a statement, recording it as the last execution.
    async fn dispatch(&mut self, statement: &Statement) -> MysqlResult<Outcome> {
        self.last = Some(Execution {
            sql: statement.sql.clone(),
            values: statement.values.clone(),
            outcome: None,
        });
        let decode = self.decode_options();
        let outcome = executor::run(self.raw()?, statement, decode).await?;
        if let Some(last) = self.last.as_mut() {
            last.outcome = Some(outcome.clone());
        }
        Ok(outcome)
    }

    async fn dispatch_rows(&mut self, statement: &Statement) -> MysqlResult<RowSet> {
        match self.dispatch(statement).await? {
            Outcome::Rows(rows) => Ok(rows),
            Outcome::Done(_) => Err(MysqlError::internal("Statement returned no row set")),
        }
    }

    async fn dispatch_done(&mut self, statement: &Statement) -> MysqlResult<Done> {
        match self.dispatch(statement).await? {
            Outcome::Done(done) => Ok(done),
            Outcome::Rows(_) => Err(MysqlError::internal("Statement returned a row set")),
        }
    }

    /// Run a guarded DDL statement; `true` when it created or dropped something.
    async fn dispatch_definition(&mut self, statement: &Statement) -> MysqlResult<bool> {
        self.last = Some(Execution {
            sql: statement.sql.clone(),
            values: Vec::new(),
            outcome: None,
        });
        let (done, applied) = executor::execute_definition(self.raw()?, &statement.sql).await?;
        if let Some(last) = self.last.as_mut() {
            last.outcome = Some(Outcome::Done(done));
        }
        Ok(applied)
    }

    // =========================================================================
    // Raw statements
    // =========================================================================

    /// Run arbitrary SQL that returns rows.
    pub async fn query(&mut self, sql: &str, values: &[Value]) -> MysqlResult<Vec<Row>> {
        let rows = self
            .dispatch_rows(&Statement::rows(sql, values.to_vec()))
            .await?;
        Ok(rows.rows)
    }

    /// Run arbitrary SQL that returns no rows.
    pub async fn execute(&mut self, sql: &str, values: &[Value]) -> MysqlResult<Done> {
        self.dispatch_done(&Statement::mutation(sql, values.to_vec()))
            .await
    }

    // =========================================================================
    // Schema operations
    // =========================================================================

    /// `true` when the database was created, `false` when it already existed.
    pub async fn create_database(
        &mut self,
        name: &str,
        options: &DatabaseOptions,
    ) -> MysqlResult<bool> {
        self.dispatch_definition(&ddl::create_database(name, options))
            .await
    }

    /// `true` when the database was dropped, `false` when it did not exist.
    pub async fn drop_database(&mut self, name: &str) -> MysqlResult<bool> {
        self.dispatch_definition(&ddl::drop_database(name)).await
    }

    /// `true` when the table was created, `false` when it already existed.
    ///
    /// The table is created in the configured default database when there is
    /// one.
    pub async fn create_table(
        &mut self,
        name: &str,
        columns: &[(&str, ColumnSpec)],
        options: &TableOptions,
    ) -> MysqlResult<bool> {
        let statement = ddl::create_table(self.options.database.as_deref(), name, columns, options);
        self.dispatch_definition(&statement).await
    }

    /// `true` when every named table was dropped.
    pub async fn drop_table(&mut self, names: &[&str]) -> MysqlResult<bool> {
        let statement = ddl::drop_table(self.options.database.as_deref(), names);
        self.dispatch_definition(&statement).await
    }

    // =========================================================================
    // Data operations
    // =========================================================================

    /// Insert one row and return its auto-increment id (0 without one).
    pub async fn insert(&mut self, table: &str, data: &[(&str, Value)]) -> MysqlResult<u64> {
        let done = self.dispatch_done(&dml::insert(table, data)).await?;
        Ok(done.insert_id)
    }

    pub async fn select(
        &mut self,
        table: &str,
        columns: &[&str],
        find: &Find,
    ) -> MysqlResult<Vec<Row>> {
        let rows = self
            .dispatch_rows(&dml::select(table, columns, find))
            .await?;
        Ok(rows.rows)
    }

    /// First matching row, or `None`.
    pub async fn select_one(
        &mut self,
        table: &str,
        columns: &[&str],
        find: &Find,
    ) -> MysqlResult<Option<Row>> {
        let rows = self
            .dispatch_rows(&dml::select_one(table, columns, find))
            .await?;
        Ok(rows.rows.into_iter().next())
    }

    pub async fn exists(&mut self, table: &str, find: &Find) -> MysqlResult<bool> {
        let rows = self.dispatch_rows(&dml::exists(table, find)).await?;
        scalar_bool(&rows)
    }

    pub async fn count(&mut self, table: &str, find: &Find) -> MysqlResult<u64> {
        let rows = self.dispatch_rows(&dml::count(table, find)).await?;
        scalar_u64(&rows)
    }

    /// Update matching rows and return how many actually changed.
    ///
    /// Matched rows whose stored bytes already equal the assignment are not
    /// counted. The count is taken on this connection right before the
    /// update, locking the matched rows; inside a transaction no other writer
    /// can touch them until commit. Under autocommit the lock ends with the
    /// counting statement, so a concurrent writer can still slip in between.
    ///
    /// If the count cannot be taken the update still runs, so a bad SET list
    /// reports the UPDATE's own error; a successful update then returns the
    /// affected rows.
    pub async fn update(
        &mut self,
        table: &str,
        assignment: &Assignment,
        find: &Find,
    ) -> MysqlResult<u64> {
        let changed = if assignment.is_empty() {
            Some(0)
        } else {
            let counting = dml::count_changed(table, assignment, find);
            let decode = self.decode_options();
            let counted = executor::fetch(self.raw()?, &counting.sql, &counting.values, decode)
                .await
                .and_then(|rows| scalar_u64(&rows));
            match counted {
                Ok(n) => Some(n),
                Err(e) => {
                    debug!(error = %e, "Could not count changed rows before update");
                    None
                }
            }
        };

        let done = self
            .dispatch_done(&dml::update(table, assignment, find))
            .await?;
        let changed = match changed {
            Some(n) => n.min(done.affected_rows),
            None => {
                warn!(table, "Changed rows unknown, returning affected rows");
                done.affected_rows
            }
        };
        if let Some(Execution {
            outcome: Some(Outcome::Done(recorded)),
            ..
        }) = self.last.as_mut()
        {
            recorded.changed_rows = Some(changed);
        }
        Ok(changed)
    }

    /// Delete matching rows and return how many were affected.
    pub async fn delete(&mut self, table: &str, find: &Find) -> MysqlResult<u64> {
        let done = self.dispatch_done(&dml::delete(table, find)).await?;
        Ok(done.affected_rows)
    }

    // =========================================================================
    // Transaction control
    // =========================================================================

    pub async fn begin_transaction(&mut self) -> MysqlResult<()> {
        if self.state == ConnectionState::InTransaction {
            return Err(MysqlError::transaction(
                "A transaction is already open on this connection",
            ));
        }
        executor::execute(self.raw()?, "START TRANSACTION", &[]).await?;
        self.state = ConnectionState::InTransaction;
        Ok(())
    }

    pub async fn commit(&mut self) -> MysqlResult<()> {
        executor::execute(self.raw()?, "COMMIT", &[]).await?;
        self.state = ConnectionState::Acquired;
        Ok(())
    }

    pub async fn rollback(&mut self) -> MysqlResult<()> {
        executor::execute(self.raw()?, "ROLLBACK", &[]).await?;
        self.state = ConnectionState::Acquired;
        Ok(())
    }

    // =========================================================================
    // Release
    // =========================================================================

    /// Return the connection to the pool.
    ///
    /// A connection still inside a transaction is closed instead, so no open
    /// transaction ever goes back into the pool.
    pub fn release(self) {
        debug!(state = ?self.state, "Releasing connection");
        drop(self);
    }

    /// Close the physical connection instead of returning it to the pool.
    ///
    /// Later operations on this connection fail with
    /// [`MysqlError::ConnectionDestroyed`]; the server rolls back any open
    /// transaction.
    pub async fn destroy(&mut self) -> MysqlResult<()> {
        self.state = ConnectionState::Destroyed;
        match self.inner.take() {
            Some(inner) => {
                use sqlx::Connection as _;
                inner.detach().close().await?;
                debug!("Connection destroyed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.state != ConnectionState::InTransaction {
            return;
        }
        let Some(inner) = self.inner.take() else {
            return;
        };

        let raw = inner.detach();
        warn!("Connection dropped inside a transaction - closing it instead of returning it to the pool");
        // Without a runtime the socket is dropped; the server rolls back either way
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                use sqlx::Connection as _;
                if let Err(e) = raw.close().await {
                    warn!(error = %e, "Failed to close abandoned transaction connection");
                }
            });
        }
    }
}
