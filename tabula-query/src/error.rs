//! Error types for compiling and executing statements.
//!
//! Every failure carries an [`ErrorCode`], a human readable message and, when
//! a statement was involved, the offending SQL. Codes group into three
//! [`ErrorKind`]s so callers can decide how to report them:
//!
//! - `QueryExecution`: the statement reached the server and failed there
//! - `DriverFatal`: the connection itself is unusable
//! - `InvalidInput`: a builder was given malformed input and refused to compile
//!
//! ```rust
//! use tabula_query::{ErrorCode, ErrorKind, QueryError};
//!
//! let err = QueryError::syntax("near 'TABEL'").with_sql("CREATE TABEL `users` ();");
//! assert_eq!(err.code, ErrorCode::SqlSyntax);
//! assert_eq!(err.kind(), ErrorKind::QueryExecution);
//! assert_eq!(err.sql(), Some("CREATE TABEL `users` ();"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Constraint errors (2xxx)
    /// Unique constraint violation (T2001).
    UniqueConstraint = 2001,
    /// Foreign key constraint violation (T2002).
    ForeignKeyConstraint = 2002,
    /// Not null constraint violation (T2004).
    NotNullConstraint = 2004,

    // Connection errors (3xxx)
    /// Database connection failed (T3001).
    ConnectionFailed = 3001,
    /// Connection timeout (T3003).
    ConnectionTimeout = 3003,
    /// Authentication failed (T3004).
    AuthenticationFailed = 3004,

    // Query execution errors (5xxx)
    /// SQL syntax error (T5002).
    SqlSyntax = 5002,
    /// Invalid parameter or builder input (T5003).
    InvalidParameter = 5003,
    /// General database error (T5005).
    DatabaseError = 5005,

    // Data errors (6xxx)
    /// Row value could not be converted (T6001).
    InvalidDataType = 6001,

    // Internal errors (9xxx)
    /// Internal error (T9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "T5002").
    pub fn code(&self) -> String {
        format!("T{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UniqueConstraint => "Unique constraint violation",
            Self::ForeignKeyConstraint => "Foreign key constraint violation",
            Self::NotNullConstraint => "Not null constraint violation",
            Self::ConnectionFailed => "Database connection failed",
            Self::ConnectionTimeout => "Connection timeout",
            Self::AuthenticationFailed => "Authentication failed",
            Self::SqlSyntax => "SQL syntax error",
            Self::InvalidParameter => "Invalid parameter",
            Self::DatabaseError => "Database error",
            Self::InvalidDataType => "Invalid data type",
            Self::Internal => "Internal error",
        }
    }

    /// The reporting category this code belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionFailed | Self::ConnectionTimeout | Self::AuthenticationFailed => {
                ErrorKind::DriverFatal
            }
            Self::InvalidParameter => ErrorKind::InvalidInput,
            _ => ErrorKind::QueryExecution,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Coarse error category used by reporting layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A statement failed against the connection.
    QueryExecution,
    /// The connection could not be established or was lost.
    DriverFatal,
    /// A builder refused malformed input.
    InvalidInput,
}

impl ErrorKind {
    /// Stable name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryExecution => "QueryExecutionError",
            Self::DriverFatal => "DriverFatalError",
            Self::InvalidInput => "InvalidInputError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while compiling or executing statements.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// The SQL statement involved, if any.
    pub sql: Option<String>,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            sql: None,
            source: None,
        }
    }

    /// Attach the SQL statement that failed.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The reporting category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// The offending SQL, if one was attached.
    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    // ============== Constructor Functions ==============

    /// Create a SQL syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SqlSyntax, format!("Syntax error: {}", message.into()))
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Create an error for malformed builder input.
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidParameter,
            format!("Invalid input for {}: {}", field.into(), message.into()),
        )
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConnectionFailed,
            format!("Connection error: {}", message.into()),
        )
    }

    /// Create an authentication error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AuthenticationFailed,
            format!("Authentication failed: {}", message.into()),
        )
    }

    /// Create a connection timeout error.
    pub fn connection_timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::ConnectionTimeout,
            format!("Connection timed out after {}ms", duration_ms),
        )
    }

    /// Create a data conversion error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDataType, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
    }

    /// Check if this error means the connection is unusable.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::DriverFatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::SqlSyntax.code(), "T5002");
        assert_eq!(ErrorCode::ConnectionFailed.to_string(), "T3001");
    }

    #[test]
    fn test_error_display() {
        let err = QueryError::database("table `users` already exists");
        assert_eq!(err.to_string(), "[T5005] table `users` already exists");
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            QueryError::authentication_failed("bad password").kind(),
            ErrorKind::DriverFatal
        );
        assert_eq!(
            QueryError::invalid_input("rows", "mismatch").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            QueryError::new(ErrorCode::UniqueConstraint, "dup").kind(),
            ErrorKind::QueryExecution
        );
        assert!(QueryError::connection_timeout(5000).is_fatal());
    }

    #[test]
    fn test_with_sql() {
        let err = QueryError::syntax("unexpected token").with_sql("DROP TABEL x;");
        assert_eq!(err.sql(), Some("DROP TABEL x;"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::QueryExecution.to_string(), "QueryExecutionError");
        assert_eq!(ErrorKind::DriverFatal.as_str(), "DriverFatalError");
    }
}
