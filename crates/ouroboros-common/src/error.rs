//! Error types for ouroboros

use std::fmt;

use thiserror::Error;

/// Result type alias for ouroboros operations
pub type Result<T> = std::result::Result<T, DataAccessError>;

/// Unified error type for all ouroboros data-access operations
#[derive(Error, Debug, Clone)]
pub enum DataAccessError {
    /// The connection source is under- or over-specified, or a connection
    /// option could not be parsed. Raised when the source is resolved.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A statement failed to prepare, bind, execute or decode against the store.
    #[error("Query execution error ({kind}): {message}")]
    QueryExecution {
        kind: ExecutionErrorKind,
        message: String,
    },

    /// A row field was requested by an invalid index, an unknown name, or
    /// as an incompatible type.
    #[error("Access error: {0}")]
    Access(String),
}

/// Classification of a statement execution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    /// Network, TLS or protocol failure talking to the store
    Connection,
    /// Pool acquisition or statement timeout
    Timeout,
    /// Unique / exclusion constraint violation
    Conflict,
    /// Foreign key constraint violation
    ForeignKey,
    /// Not-null or check constraint violation
    Constraint,
    /// Deadlock detected
    Deadlock,
    /// Serialization failure, lock contention or admin shutdown
    Transient,
    /// A parameter could not be bound
    Encode,
    /// A column value could not be decoded
    Decode,
    /// Any other error reported by the database (syntax errors, missing tables, ...)
    Database,
    /// Driver-internal failure
    Internal,
}

impl ExecutionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionErrorKind::Connection => "connection",
            ExecutionErrorKind::Timeout => "timeout",
            ExecutionErrorKind::Conflict => "conflict",
            ExecutionErrorKind::ForeignKey => "foreign key",
            ExecutionErrorKind::Constraint => "constraint",
            ExecutionErrorKind::Deadlock => "deadlock",
            ExecutionErrorKind::Transient => "transient",
            ExecutionErrorKind::Encode => "encode",
            ExecutionErrorKind::Decode => "decode",
            ExecutionErrorKind::Database => "database",
            ExecutionErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DataAccessError {
    /// Builds a query execution error of the given kind.
    pub fn execution(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        DataAccessError::QueryExecution {
            kind,
            message: message.into(),
        }
    }

    /// Returns the execution error kind, if this is an execution error.
    pub fn execution_kind(&self) -> Option<ExecutionErrorKind> {
        match self {
            DataAccessError::QueryExecution { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, DataAccessError::Configuration(_))
    }

    pub fn is_query_execution(&self) -> bool {
        matches!(self, DataAccessError::QueryExecution { .. })
    }

    pub fn is_access(&self) -> bool {
        matches!(self, DataAccessError::Access(_))
    }

    /// Returns true if this error is potentially retryable.
    ///
    /// Nothing in ouroboros retries statements; this is a hint for callers
    /// that implement their own retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.execution_kind(),
            Some(
                ExecutionErrorKind::Deadlock
                    | ExecutionErrorKind::Timeout
                    | ExecutionErrorKind::Transient
                    | ExecutionErrorKind::Connection
            )
        )
    }

    /// Returns true if this is a constraint violation error
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self.execution_kind(),
            Some(
                ExecutionErrorKind::Conflict
                    | ExecutionErrorKind::ForeignKey
                    | ExecutionErrorKind::Constraint
            )
        )
    }
}

// sqlx error conversions (when sqlx-errors feature is enabled)
#[cfg(feature = "sqlx-errors")]
impl From<sqlx::Error> for DataAccessError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error;
        let kind = match &err {
            Error::Configuration(_) => return DataAccessError::Configuration(err.to_string()),
            Error::Database(db_err) => classify_database_error(db_err.as_ref()),
            Error::Io(_) | Error::Tls(_) | Error::Protocol(_) => ExecutionErrorKind::Connection,
            Error::PoolTimedOut => ExecutionErrorKind::Timeout,
            Error::PoolClosed => ExecutionErrorKind::Connection,
            Error::TypeNotFound { .. }
            | Error::ColumnDecode { .. }
            | Error::Decode(_) => ExecutionErrorKind::Decode,
            Error::RowNotFound
            | Error::ColumnIndexOutOfBounds { .. }
            | Error::ColumnNotFound(_) => ExecutionErrorKind::Database,
            Error::WorkerCrashed => ExecutionErrorKind::Internal,
            _ => ExecutionErrorKind::Database,
        };
        DataAccessError::execution(kind, err.to_string())
    }
}

#[cfg(feature = "sqlx-errors")]
fn classify_database_error(db_err: &dyn sqlx::error::DatabaseError) -> ExecutionErrorKind {
    use sqlx::error::ErrorKind;

    match db_err.kind() {
        ErrorKind::UniqueViolation => return ExecutionErrorKind::Conflict,
        ErrorKind::ForeignKeyViolation => return ExecutionErrorKind::ForeignKey,
        ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
            return ExecutionErrorKind::Constraint
        }
        _ => {}
    }

    let Some(code) = db_err.code() else {
        return ExecutionErrorKind::Database;
    };

    // PostgreSQL SQLSTATE codes and SQLite (extended) result codes
    // See: https://www.postgresql.org/docs/current/errcodes-appendix.html
    // See: https://www.sqlite.org/rescode.html
    match code.as_ref() {
        "23P01" => ExecutionErrorKind::Conflict,
        "40P01" => ExecutionErrorKind::Deadlock,
        code if code.starts_with("40") => ExecutionErrorKind::Transient,
        code if code.starts_with("08") => ExecutionErrorKind::Connection,
        "57P01" | "57P02" | "57P03" => ExecutionErrorKind::Transient,
        "57014" => ExecutionErrorKind::Timeout,
        // SQLITE_BUSY, SQLITE_LOCKED and their extended codes
        "5" | "6" | "261" | "517" | "262" => ExecutionErrorKind::Transient,
        _ => ExecutionErrorKind::Database,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_configuration() {
        let err = DataAccessError::Configuration("no connection source".to_string());
        assert_eq!(err.to_string(), "Configuration error: no connection source");
    }

    #[test]
    fn test_error_display_query_execution() {
        let err = DataAccessError::execution(ExecutionErrorKind::Database, "near \"SELEKT\": syntax error");
        assert_eq!(
            err.to_string(),
            "Query execution error (database): near \"SELEKT\": syntax error"
        );
    }

    #[test]
    fn test_error_display_access() {
        let err = DataAccessError::Access("no column named 'nme'".to_string());
        assert_eq!(err.to_string(), "Access error: no column named 'nme'");
    }

    #[test]
    fn test_execution_kind() {
        let err = DataAccessError::execution(ExecutionErrorKind::Deadlock, "deadlock detected");
        assert_eq!(err.execution_kind(), Some(ExecutionErrorKind::Deadlock));
        assert_eq!(DataAccessError::Access("x".into()).execution_kind(), None);
    }

    #[test]
    fn test_kind_predicates() {
        assert!(DataAccessError::Configuration("x".into()).is_configuration());
        assert!(DataAccessError::Access("x".into()).is_access());
        assert!(DataAccessError::execution(ExecutionErrorKind::Internal, "x").is_query_execution());
        assert!(!DataAccessError::Access("x".into()).is_query_execution());
    }

    #[test]
    fn test_is_retryable() {
        let retryable = [
            ExecutionErrorKind::Deadlock,
            ExecutionErrorKind::Timeout,
            ExecutionErrorKind::Transient,
            ExecutionErrorKind::Connection,
        ];
        for kind in retryable {
            assert!(DataAccessError::execution(kind, "test").is_retryable(), "{kind} should be retryable");
        }

        assert!(!DataAccessError::execution(ExecutionErrorKind::Conflict, "test").is_retryable());
        assert!(!DataAccessError::execution(ExecutionErrorKind::Database, "test").is_retryable());
        assert!(!DataAccessError::Configuration("test".into()).is_retryable());
    }

    #[test]
    fn test_is_constraint_violation() {
        assert!(DataAccessError::execution(ExecutionErrorKind::Conflict, "test").is_constraint_violation());
        assert!(DataAccessError::execution(ExecutionErrorKind::ForeignKey, "test").is_constraint_violation());
        assert!(DataAccessError::execution(ExecutionErrorKind::Constraint, "test").is_constraint_violation());
        assert!(!DataAccessError::execution(ExecutionErrorKind::Deadlock, "test").is_constraint_violation());
        assert!(!DataAccessError::Access("test".into()).is_constraint_violation());
    }

    #[cfg(feature = "sqlx-errors")]
    #[test]
    fn test_from_sqlx_pool_errors() {
        let err: DataAccessError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.execution_kind(), Some(ExecutionErrorKind::Timeout));

        let err: DataAccessError = sqlx::Error::PoolClosed.into();
        assert_eq!(err.execution_kind(), Some(ExecutionErrorKind::Connection));

        let err: DataAccessError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.execution_kind(), Some(ExecutionErrorKind::Database));
    }

    #[cfg(feature = "sqlx-errors")]
    #[test]
    fn test_from_sqlx_configuration_error() {
        let err: DataAccessError = sqlx::Error::Configuration("bad url".into()).into();
        assert!(err.is_configuration());
    }
}
