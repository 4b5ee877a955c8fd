//! Error types for MySQL operations.

use mysql_async::ServerError;
use tabula_query::{ErrorCode, QueryError};
use thiserror::Error;

/// Result type for MySQL operations.
pub type MysqlResult<T> = Result<T, MysqlError>;

/// Error type for MySQL operations.
#[derive(Error, Debug)]
pub enum MysqlError {
    /// MySQL driver error.
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection could not be established in time.
    #[error("Timeout error: connecting took longer than {0}ms")]
    Timeout(u64),

    /// Value could not be sent to or read from the server.
    #[error("Type conversion error: {0}")]
    TypeConversion(String),
}

impl MysqlError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a type conversion error.
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }
}

// Server error numbers from the MySQL reference manual.
const ER_ACCESS_DENIED: u16 = 1045;
const ER_DUP_ENTRY: u16 = 1062;
const ER_BAD_NULL: u16 = 1048;
const ER_PARSE: u16 = 1064;
const ER_ROW_IS_REFERENCED: u16 = 1451;
const ER_NO_REFERENCED_ROW: u16 = 1452;

fn from_server(err: &ServerError) -> QueryError {
    let message = format!("{} (errno {}, state {})", err.message, err.code, err.state);
    match err.code {
        ER_ACCESS_DENIED => QueryError::authentication_failed(message),
        ER_DUP_ENTRY => QueryError::new(ErrorCode::UniqueConstraint, message),
        ER_BAD_NULL => QueryError::new(ErrorCode::NotNullConstraint, message),
        ER_PARSE => QueryError::syntax(message),
        ER_ROW_IS_REFERENCED | ER_NO_REFERENCED_ROW => {
            QueryError::new(ErrorCode::ForeignKeyConstraint, message)
        }
        _ => QueryError::database(message),
    }
}

impl From<MysqlError> for QueryError {
    fn from(err: MysqlError) -> Self {
        match err {
            MysqlError::Mysql(mysql_async::Error::Server(ref server)) => {
                from_server(server).with_source(err)
            }
            MysqlError::Mysql(mysql_async::Error::Io(_) | mysql_async::Error::Driver(_)) => {
                QueryError::connection(err.to_string()).with_source(err)
            }
            MysqlError::Mysql(_) => QueryError::database(err.to_string()).with_source(err),
            MysqlError::Config(msg) => QueryError::internal(format!("config: {}", msg)),
            MysqlError::Timeout(ms) => QueryError::connection_timeout(ms),
            MysqlError::TypeConversion(msg) => QueryError::invalid_data(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_query::ErrorKind;

    fn server(code: u16) -> MysqlError {
        MysqlError::Mysql(mysql_async::Error::Server(ServerError {
            code,
            message: "boom".to_string(),
            state: "HY000".to_string(),
        }))
    }

    #[test]
    fn test_error_display() {
        let err = MysqlError::config("invalid url");
        assert_eq!(err.to_string(), "Configuration error: invalid url");
    }

    #[test]
    fn test_server_error_codes() {
        let err: QueryError = server(ER_DUP_ENTRY).into();
        assert_eq!(err.code, ErrorCode::UniqueConstraint);
        assert!(err.message.contains("errno 1062"));

        let err: QueryError = server(ER_PARSE).into();
        assert_eq!(err.code, ErrorCode::SqlSyntax);

        let err: QueryError = server(ER_NO_REFERENCED_ROW).into();
        assert_eq!(err.code, ErrorCode::ForeignKeyConstraint);

        let err: QueryError = server(1146).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.kind(), ErrorKind::QueryExecution);
    }

    #[test]
    fn test_fatal_errors() {
        let err: QueryError = server(ER_ACCESS_DENIED).into();
        assert!(err.is_fatal());

        let err: QueryError = MysqlError::Timeout(30_000).into();
        assert_eq!(err.code, ErrorCode::ConnectionTimeout);
        assert!(err.is_fatal());

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err: QueryError = MysqlError::Mysql(mysql_async::Error::Io(io.into())).into();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_conversion_error() {
        let err: QueryError = MysqlError::type_conversion("bad").into();
        assert_eq!(err.code, ErrorCode::InvalidDataType);
    }
}
