//! Error types for the MySQL access layer.
//!
//! All failures surface as [`MysqlError`]. Server-reported errors keep the
//! driver's message untouched so callers can match on it, and expose the
//! symbolic MySQL error code through [`MysqlError::code`].

use sqlx::mysql::MySqlDatabaseError;
use std::io;
use thiserror::Error;

/// Server error numbers the layer cares about.
pub mod codes {
    pub const ER_DBACCESS_DENIED_ERROR: u16 = 1044;
    pub const ER_ACCESS_DENIED_ERROR: u16 = 1045;
    pub const ER_BAD_NULL_ERROR: u16 = 1048;
    pub const ER_BAD_DB_ERROR: u16 = 1049;
    pub const ER_DB_CREATE_EXISTS: u16 = 1007;
    pub const ER_DB_DROP_EXISTS: u16 = 1008;
    pub const ER_TABLE_EXISTS_ERROR: u16 = 1050;
    pub const ER_BAD_TABLE_ERROR: u16 = 1051;
    pub const ER_BAD_FIELD_ERROR: u16 = 1054;
    pub const ER_DUP_ENTRY: u16 = 1062;
    pub const ER_PARSE_ERROR: u16 = 1064;
    pub const ER_NO_SUCH_TABLE: u16 = 1146;
    pub const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
    pub const ER_LOCK_DEADLOCK: u16 = 1213;
    pub const ER_NO_DEFAULT_FOR_FIELD: u16 = 1364;
    pub const ER_DATA_TOO_LONG: u16 = 1406;
    pub const ER_ACCESS_DENIED_NO_PASSWORD_ERROR: u16 = 1698;
}

#[derive(Error, Debug)]
pub enum MysqlError {
    /// Error reported by the server. Displays the server message verbatim.
    #[error("{message}")]
    Database {
        message: String,
        number: Option<u16>,
        sql_state: Option<String>,
    },

    #[error("Connection failed: {message}")]
    Connection {
        message: String,
        suggestion: String,
        io_kind: Option<io::ErrorKind>,
    },

    #[error("No connections available.")]
    PoolExhausted { limit: u32 },

    #[error("Connection pool is closed")]
    PoolClosed,

    #[error("Timeout: {operation} exceeded {elapsed_ms}ms")]
    Timeout { operation: String, elapsed_ms: u64 },

    #[error("Connection was destroyed")]
    ConnectionDestroyed,

    #[error("Transaction error: {message}")]
    Transaction { message: String },

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl MysqlError {
    /// Create a server error.
    pub fn database(
        message: impl Into<String>,
        number: Option<u16>,
        sql_state: Option<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            number,
            sql_state,
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
            io_kind: None,
        }
    }

    pub fn pool_exhausted(limit: u32) -> Self {
        Self::PoolExhausted { limit }
    }

    pub fn timeout(operation: impl Into<String>, elapsed_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_ms,
        }
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Server error number, when the server reported one.
    pub fn number(&self) -> Option<u16> {
        match self {
            Self::Database { number, .. } => *number,
            _ => None,
        }
    }

    /// Symbolic error code, e.g. `ER_DUP_ENTRY` or `ECONNREFUSED`.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Database {
                number: Some(number),
                ..
            } => code_name(*number),
            Self::Connection {
                io_kind: Some(kind),
                ..
            } => match kind {
                io::ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
                io::ErrorKind::ConnectionReset => Some("ECONNRESET"),
                io::ErrorKind::TimedOut => Some("ETIMEDOUT"),
                io::ErrorKind::NotFound => Some("ENOENT"),
                _ => None,
            },
            Self::PoolExhausted { .. } => Some("POOL_ENOCONNECTION"),
            Self::PoolClosed => Some("POOL_CLOSED"),
            _ => None,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } | Self::Timeout { .. } | Self::PoolExhausted { .. } => true,
            Self::Database {
                number: Some(number),
                ..
            } => matches!(
                *number,
                codes::ER_LOCK_WAIT_TIMEOUT | codes::ER_LOCK_DEADLOCK
            ),
            _ => false,
        }
    }

    /// Errors the ready probe gives up on immediately: retrying cannot fix
    /// bad credentials or a missing database.
    pub fn is_fatal_for_probe(&self) -> bool {
        matches!(
            self.number(),
            Some(
                codes::ER_DBACCESS_DENIED_ERROR
                    | codes::ER_ACCESS_DENIED_ERROR
                    | codes::ER_BAD_DB_ERROR
                    | codes::ER_ACCESS_DENIED_NO_PASSWORD_ERROR
            )
        ) || matches!(self, Self::Configuration { .. } | Self::PoolClosed)
    }
}

fn code_name(number: u16) -> Option<&'static str> {
    use codes::*;
    let name = match number {
        ER_DB_CREATE_EXISTS => "ER_DB_CREATE_EXISTS",
        ER_DB_DROP_EXISTS => "ER_DB_DROP_EXISTS",
        ER_DBACCESS_DENIED_ERROR => "ER_DBACCESS_DENIED_ERROR",
        ER_ACCESS_DENIED_ERROR => "ER_ACCESS_DENIED_ERROR",
        ER_BAD_NULL_ERROR => "ER_BAD_NULL_ERROR",
        ER_BAD_DB_ERROR => "ER_BAD_DB_ERROR",
        ER_TABLE_EXISTS_ERROR => "ER_TABLE_EXISTS_ERROR",
        ER_BAD_TABLE_ERROR => "ER_BAD_TABLE_ERROR",
        ER_BAD_FIELD_ERROR => "ER_BAD_FIELD_ERROR",
        ER_DUP_ENTRY => "ER_DUP_ENTRY",
        ER_PARSE_ERROR => "ER_PARSE_ERROR",
        ER_NO_SUCH_TABLE => "ER_NO_SUCH_TABLE",
        ER_LOCK_WAIT_TIMEOUT => "ER_LOCK_WAIT_TIMEOUT",
        ER_LOCK_DEADLOCK => "ER_LOCK_DEADLOCK",
        ER_NO_DEFAULT_FOR_FIELD => "ER_NO_DEFAULT_FOR_FIELD",
        ER_DATA_TOO_LONG => "ER_DATA_TOO_LONG",
        ER_ACCESS_DENIED_NO_PASSWORD_ERROR => "ER_ACCESS_DENIED_NO_PASSWORD_ERROR",
        _ => return None,
    };
    Some(name)
}

/// Convert sqlx errors to MysqlError.
impl From<sqlx::Error> for MysqlError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => MysqlError::configuration(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                let number = db_err
                    .try_downcast_ref::<MySqlDatabaseError>()
                    .map(MySqlDatabaseError::number);
                let sql_state = db_err.code().map(|c| c.to_string());
                MysqlError::database(db_err.message(), number, sql_state)
            }
            // Mysql::get_connection substitutes the configured acquire timeout
            sqlx::Error::PoolTimedOut => MysqlError::timeout("connection pool acquire", 0),
            sqlx::Error::PoolClosed => MysqlError::PoolClosed,
            sqlx::Error::Io(io_err) => MysqlError::Connection {
                message: format!("I/O error: {}", io_err),
                suggestion: "Check network connectivity and database server status".to_string(),
                io_kind: Some(io_err.kind()),
            },
            sqlx::Error::Tls(tls_err) => MysqlError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => MysqlError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                MysqlError::decode(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => MysqlError::decode(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                MysqlError::decode(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => MysqlError::decode(source.to_string()),
            sqlx::Error::WorkerCrashed => MysqlError::internal("Database worker crashed"),
            _ => MysqlError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type MysqlResult<T> = Result<T, MysqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_displays_server_message() {
        let err = MysqlError::database(
            "Duplicate entry 'bob' for key 'username'",
            Some(codes::ER_DUP_ENTRY),
            Some("23000".to_string()),
        );
        assert_eq!(err.to_string(), "Duplicate entry 'bob' for key 'username'");
        assert_eq!(err.code(), Some("ER_DUP_ENTRY"));
        assert_eq!(err.number(), Some(1062));
    }

    #[test]
    fn test_pool_exhausted_message() {
        let err = MysqlError::pool_exhausted(1);
        assert_eq!(err.to_string(), "No connections available.");
        assert!(err.is_retryable());
        assert!(!err.is_fatal_for_probe());
    }

    #[test]
    fn test_refused_connection_code() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err = MysqlError::from(sqlx::Error::Io(io_err));
        assert_eq!(err.code(), Some("ECONNREFUSED"));
        assert!(err.is_retryable());
        assert!(!err.is_fatal_for_probe());
    }

    #[test]
    fn test_fatal_probe_errors() {
        let bad_db = MysqlError::database("Unknown database 'nope'", Some(1049), None);
        assert!(bad_db.is_fatal_for_probe());
        assert_eq!(bad_db.code(), Some("ER_BAD_DB_ERROR"));

        let denied = MysqlError::database("Access denied", Some(1045), None);
        assert!(denied.is_fatal_for_probe());

        let syntax = MysqlError::database("syntax", Some(1064), None);
        assert!(!syntax.is_fatal_for_probe());
        assert!(!syntax.is_retryable());
    }

    #[test]
    fn test_deadlock_is_retryable() {
        let err = MysqlError::database("Deadlock found", Some(codes::ER_LOCK_DEADLOCK), None);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unknown_number_has_no_code() {
        let err = MysqlError::database("odd", Some(9999), None);
        assert_eq!(err.code(), None);
        assert_eq!(MysqlError::internal("x").code(), None);
    }
}
