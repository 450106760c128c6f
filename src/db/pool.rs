//! Connection pool wrapper.
//!
//! [`Mysql`] holds the driver pool and exposes the documented operation set.
//! Each pooled operation reserves its own connection, so concurrent calls on
//! one `Mysql` have no ordering guarantee relative to each other; use
//! [`Mysql::get_connection`] or [`Mysql::transaction`] to pin a sequence of
//! statements to one connection.

use crate::config::MysqlOptions;
use crate::db::connection::Connection;
use crate::error::{MysqlError, MysqlResult};
use crate::models::{
    Assignment, ColumnSpec, DatabaseOptions, Done, Execution, Find, Row, TableOptions, Value,
};
use sqlx::pool::PoolConnection;
use sqlx::{ConnectOptions, MySql, MySqlPool};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Budget for [`Mysql::connect`].
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Pause between ready-probe attempts.
pub const READY_INTERVAL: Duration = Duration::from_millis(500);

/// Default attempts for [`Mysql::wait_connection`].
pub const DEFAULT_WAIT_RETRIES: u32 = 10;

/// When to stop retrying the ready probe.
#[derive(Debug, Clone, Copy)]
enum ProbeBudget {
    Deadline(Instant),
    Attempts(u32),
}

impl ProbeBudget {
    fn exhausted(self, attempt: u32, interval: Duration) -> bool {
        match self {
            Self::Deadline(deadline) => Instant::now() + interval > deadline,
            Self::Attempts(max) => attempt >= max,
        }
    }
}

#[derive(Clone)]
pub struct Mysql {
    pool: MySqlPool,
    options: Arc<MysqlOptions>,
    last: Arc<Mutex<Option<Execution>>>,
}

impl std::fmt::Debug for Mysql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mysql")
            .field("options", &self.options)
            .field("size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .finish_non_exhaustive()
    }
}

impl Mysql {
    /// Create the pool without connecting.
    ///
    /// Connections are opened on first use; call [`Mysql::ready`] to confirm
    /// the server is reachable.
    pub fn new(options: MysqlOptions) -> Self {
        let pool = options
            .pool_options()
            .connect_lazy_with(options.connect_options());

        info!(
            host = %options.host,
            port = options.port,
            socket = ?options.socket_path,
            database = ?options.database,
            connection_limit = options.connection_limit,
            wait_for_connections = options.wait_for_connections,
            "Created MySQL pool"
        );

        Self {
            pool,
            options: Arc::new(options),
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Create the pool and wait until it can hand out a connection.
    pub async fn connect(options: MysqlOptions) -> MysqlResult<Self> {
        let db = Self::new(options);
        db.ready(DEFAULT_READY_TIMEOUT).await?;
        Ok(db)
    }

    pub fn options(&self) -> &MysqlOptions {
        &self.options
    }

    /// The most recent statement run through this pool's operations.
    ///
    /// A debugging aid: with concurrent callers it reflects whichever call
    /// finished last.
    pub fn last_execution(&self) -> Option<Execution> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn remember(&self, conn: &Connection) {
        if let Some(execution) = conn.last_execution() {
            *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(execution.clone());
        }
    }

    // =========================================================================
    // Acquisition
    // =========================================================================

    /// Reserve one connection.
    ///
    /// With `wait_for_connections` off, a saturated pool fails immediately
    /// with [`MysqlError::PoolExhausted`] instead of queueing.
    pub async fn get_connection(&self) -> MysqlResult<Connection> {
        if self.pool.is_closed() {
            return Err(MysqlError::PoolClosed);
        }

        let inner = if self.options.wait_for_connections {
            self.acquire().await?
        } else {
            match self.pool.try_acquire() {
                Some(inner) => inner,
                None if self.pool.size() >= self.options.connection_limit => {
                    debug!(
                        limit = self.options.connection_limit,
                        "Pool saturated and not queueing"
                    );
                    return Err(MysqlError::pool_exhausted(self.options.connection_limit));
                }
                None => self.acquire().await?,
            }
        };

        Ok(Connection::new(inner, Arc::clone(&self.options)))
    }

    async fn acquire(&self) -> MysqlResult<PoolConnection<MySql>> {
        self.pool.acquire().await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut => self.acquire_timed_out(),
            e => MysqlError::from(e),
        })
    }

    fn acquire_timed_out(&self) -> MysqlError {
        MysqlError::timeout(
            "connection pool acquire",
            self.options.acquire_timeout.as_millis() as u64,
        )
    }

    /// Acquire and immediately release one connection.
    async fn probe(&self) -> MysqlResult<()> {
        match self.get_connection().await {
            Ok(conn) => {
                conn.release();
                Ok(())
            }
            Err(MysqlError::Timeout { .. }) if self.pool.size() == 0 => Err(self.diagnose().await),
            Err(e) => Err(e),
        }
    }

    /// The pool reports refused connections only as an acquire timeout; a
    /// direct connection attempt recovers the underlying error.
    async fn diagnose(&self) -> MysqlError {
        match self.options.connect_options().connect().await {
            Ok(conn) => {
                use sqlx::Connection as _;
                let _ = conn.close().await;
                self.acquire_timed_out()
            }
            Err(e) => MysqlError::from(e),
        }
    }

    async fn probe_until(&self, budget: ProbeBudget, interval: Duration) -> MysqlResult<()> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match self.probe().await {
                Ok(()) => {
                    debug!(attempt, "Connection pool ready");
                    return Ok(());
                }
                Err(e) if e.is_fatal_for_probe() => return Err(e),
                Err(e) => e,
            };

            if budget.exhausted(attempt, interval) {
                warn!(attempt, error = %err, "Connection pool not ready, giving up");
                return Err(err);
            }

            warn!(attempt, error = %err, "Connection pool not ready, retrying");
            tokio::time::sleep(interval).await;
        }
    }

    /// Wait until a connection can be acquired, for at most `timeout`.
    ///
    /// Access-denied and unknown-database errors fail immediately; anything
    /// else is retried every 500ms until the budget runs out, then the last
    /// error is returned. A zero timeout makes exactly one attempt.
    pub async fn ready(&self, timeout: Duration) -> MysqlResult<()> {
        self.probe_until(ProbeBudget::Deadline(Instant::now() + timeout), READY_INTERVAL)
            .await
    }

    /// Like [`Mysql::ready`], bounded by attempts instead of time: at most
    /// `retries` attempts, `interval` apart.
    pub async fn wait_connection(&self, retries: u32, interval: Duration) -> MysqlResult<()> {
        self.probe_until(ProbeBudget::Attempts(retries.max(1)), interval)
            .await
    }

    /// Close the pool. Reserved connections close as they are released.
    pub async fn end(&self) {
        self.pool.close().await;
        info!("MySQL pool closed");
    }

    // =========================================================================
    // Pooled operations
    // =========================================================================

    pub async fn query(&self, sql: &str, values: &[Value]) -> MysqlResult<Vec<Row>> {
        on_pooled_connection!(self, |conn| conn.query(sql, values))
    }

    pub async fn execute(&self, sql: &str, values: &[Value]) -> MysqlResult<Done> {
        on_pooled_connection!(self, |conn| conn.execute(sql, values))
    }

    pub async fn create_database(
        &self,
        name: &str,
        options: &DatabaseOptions,
    ) -> MysqlResult<bool> {
        on_pooled_connection!(self, |conn| conn.create_database(name, options))
    }

    pub async fn drop_database(&self, name: &str) -> MysqlResult<bool> {
        on_pooled_connection!(self, |conn| conn.drop_database(name))
    }

    pub async fn create_table(
        &self,
        name: &str,
        columns: &[(&str, ColumnSpec)],
        options: &TableOptions,
    ) -> MysqlResult<bool> {
        on_pooled_connection!(self, |conn| conn.create_table(name, columns, options))
    }

    pub async fn drop_table(&self, names: &[&str]) -> MysqlResult<bool> {
        on_pooled_connection!(self, |conn| conn.drop_table(names))
    }

    pub async fn insert(&self, table: &str, data: &[(&str, Value)]) -> MysqlResult<u64> {
        on_pooled_connection!(self, |conn| conn.insert(table, data))
    }

    pub async fn select(
        &self,
        table: &str,
        columns: &[&str],
        find: &Find,
    ) -> MysqlResult<Vec<Row>> {
        on_pooled_connection!(self, |conn| conn.select(table, columns, find))
    }

    pub async fn select_one(
        &self,
        table: &str,
        columns: &[&str],
        find: &Find,
    ) -> MysqlResult<Option<Row>> {
        on_pooled_connection!(self, |conn| conn.select_one(table, columns, find))
    }

    pub async fn exists(&self, table: &str, find: &Find) -> MysqlResult<bool> {
        on_pooled_connection!(self, |conn| conn.exists(table, find))
    }

    pub async fn count(&self, table: &str, find: &Find) -> MysqlResult<u64> {
        on_pooled_connection!(self, |conn| conn.count(table, find))
    }

    pub async fn update(
        &self,
        table: &str,
        assignment: &Assignment,
        find: &Find,
    ) -> MysqlResult<u64> {
        on_pooled_connection!(self, |conn| conn.update(table, assignment, find))
    }

    pub async fn delete(&self, table: &str, find: &Find) -> MysqlResult<u64> {
        on_pooled_connection!(self, |conn| conn.delete(table, find))
    }
}
