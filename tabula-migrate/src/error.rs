//! Error types for the migration runner.

use tabula_query::{ErrorKind, QueryError};
use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Reporting category of a [`MigrationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationErrorKind {
    /// A statement failed against the connection.
    QueryExecution,
    /// The orchestrating layer asked for something illegal.
    MigrationPolicy,
    /// The connection could not be established or was lost.
    DriverFatal,
    /// Anything else: configuration, files, handlers, builder input.
    Other,
}

impl MigrationErrorKind {
    /// Stable name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryExecution => "QueryExecutionError",
            Self::MigrationPolicy => "MigrationPolicyError",
            Self::DriverFatal => "DriverFatalError",
            Self::Other => "MigrationError",
        }
    }
}

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A statement failed while running a migration.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Illegal migration operation, e.g. an out-of-range rollback step.
    #[error("Migration policy error: {0}")]
    Policy(String),

    /// Migration not found.
    #[error("Migration '{0}' not found")]
    NotFound(String),

    /// Invalid migration file or name.
    #[error("Invalid migration: {0}")]
    InvalidMigration(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A progress handler rejected an event.
    #[error("Handler error: {0}")]
    Handler(String),
}

impl MigrationError {
    /// Create a policy error.
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a handler error.
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    /// The reporting category.
    pub fn kind(&self) -> MigrationErrorKind {
        match self {
            Self::Query(err) => match err.kind() {
                ErrorKind::QueryExecution => MigrationErrorKind::QueryExecution,
                ErrorKind::DriverFatal => MigrationErrorKind::DriverFatal,
                ErrorKind::InvalidInput => MigrationErrorKind::Other,
            },
            Self::Policy(_) => MigrationErrorKind::MigrationPolicy,
            _ => MigrationErrorKind::Other,
        }
    }

    /// The offending SQL, when a statement failed.
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Query(err) => err.sql(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_is_transparent() {
        let err: MigrationError = QueryError::syntax("near 'X'").with_sql("X;").into();
        assert_eq!(err.to_string(), "[T5002] Syntax error: near 'X'");
        assert_eq!(err.kind(), MigrationErrorKind::QueryExecution);
        assert_eq!(err.query(), Some("X;"));
    }

    #[test]
    fn test_policy_kind() {
        let err = MigrationError::policy("cannot roll back 3 batches, only 1 exist");
        assert_eq!(err.kind(), MigrationErrorKind::MigrationPolicy);
        assert_eq!(err.kind().as_str(), "MigrationPolicyError");
        assert!(err.to_string().contains("only 1 exist"));
    }

    #[test]
    fn test_fatal_kind() {
        let err: MigrationError = QueryError::connection("refused").into();
        assert_eq!(err.kind(), MigrationErrorKind::DriverFatal);
    }
}
