//! Error types for pgfacade

use std::time::Duration;
use thiserror::Error;

/// Result type alias for pgfacade operations
pub type PgResult<T> = Result<T, PgError>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for statement building and execution.
///
/// Builder-level variants (`InvalidIdentifier`, `InvalidOperator`, `Config`) are raised
/// before any connection is touched. Execution-level variants keep the driver error as
/// their [`source`](std::error::Error::source).
#[derive(Debug, Error)]
pub enum PgError {
    /// A table or column name failed the identifier allow-list
    #[error("Invalid identifier: {message}")]
    InvalidIdentifier {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// An operator was used with values it does not accept
    #[error("Invalid operator: {message}")]
    InvalidOperator {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Malformed connection or pool configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// No usable connection (pool closed, server unreachable, connection dropped)
    #[error("Connection unavailable: {message}")]
    ConnectionUnavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Integrity constraint violation (unique, foreign key, check, not null, ...)
    #[error("Constraint violation: {message}")]
    ConstraintViolation {
        constraint: Option<String>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Statement or pool wait exceeded its deadline
    #[error("Timeout: {message}")]
    Timeout {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Anything the classifier does not recognize
    #[error("{message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Coarse classification of a [`PgError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidIdentifier,
    InvalidOperator,
    Config,
    ConnectionUnavailable,
    ConstraintViolation,
    Timeout,
    Unknown,
}

impl PgError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid operator error
    pub fn invalid_operator(message: impl Into<String>) -> Self {
        Self::InvalidOperator {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a timeout error for a statement that ran past `after`
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout {
            message: format!("statement exceeded {after:?}"),
            source: None,
        }
    }

    /// Create a connection error without an underlying cause
    pub fn connection_unavailable(message: impl Into<String>) -> Self {
        Self::ConnectionUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unknown error carrying only a message
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
            source: None,
        }
    }

    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            Self::InvalidOperator { .. } => ErrorKind::InvalidOperator,
            Self::Config(_) => ErrorKind::Config,
            Self::ConnectionUnavailable { .. } => ErrorKind::ConnectionUnavailable,
            Self::ConstraintViolation { .. } => ErrorKind::ConstraintViolation,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Check if this error was raised locally, before reaching the database
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { source: None, .. }
                | Self::InvalidOperator { source: None, .. }
                | Self::Config(_)
        )
    }

    /// Check if this is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Classify a tokio_postgres error into the pgfacade taxonomy.
    ///
    /// The original error is preserved as the source.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let code = db_err.code().code();
            let message = format!("{} (SQLSTATE {code})", db_err.message());
            let constraint = db_err.constraint().map(str::to_string);
            return Self::from_kind(classify_sqlstate(code), message, constraint, Box::new(err));
        }

        let message = err.to_string();
        let lost_connection = err.is_closed()
            || std::error::Error::source(&err).is_some_and(|s| s.is::<std::io::Error>());
        if lost_connection {
            Self::ConnectionUnavailable {
                message,
                source: Some(Box::new(err)),
            }
        } else {
            Self::Unknown {
                message,
                source: Some(Box::new(err)),
            }
        }
    }

    fn from_kind(
        kind: ErrorKind,
        message: String,
        constraint: Option<String>,
        source: BoxError,
    ) -> Self {
        let source = Some(source);
        match kind {
            ErrorKind::InvalidIdentifier => Self::InvalidIdentifier { message, source },
            ErrorKind::InvalidOperator => Self::InvalidOperator { message, source },
            ErrorKind::Config => Self::Config(message),
            ErrorKind::ConnectionUnavailable => Self::ConnectionUnavailable { message, source },
            ErrorKind::ConstraintViolation => Self::ConstraintViolation {
                constraint,
                message,
                source,
            },
            ErrorKind::Timeout => Self::Timeout { message, source },
            ErrorKind::Unknown => Self::Unknown { message, source },
        }
    }
}

/// Map a PostgreSQL SQLSTATE code to an [`ErrorKind`].
///
/// See <https://www.postgresql.org/docs/current/errcodes-appendix.html>.
pub fn classify_sqlstate(code: &str) -> ErrorKind {
    match code {
        "57014" | "55P03" => ErrorKind::Timeout,
        "53300" | "57P01" | "57P02" | "57P03" => ErrorKind::ConnectionUnavailable,
        "42P01" | "42703" | "42602" | "42622" => ErrorKind::InvalidIdentifier,
        "42883" => ErrorKind::InvalidOperator,
        _ if code.starts_with("23") => ErrorKind::ConstraintViolation,
        _ if code.starts_with("08") => ErrorKind::ConnectionUnavailable,
        _ => ErrorKind::Unknown,
    }
}

impl From<deadpool_postgres::PoolError> for PgError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        use deadpool_postgres::PoolError;

        match err {
            PoolError::Backend(e) => Self::from_db_error(e),
            PoolError::Timeout(kind) => Self::Timeout {
                message: format!("pool {kind:?} timeout"),
                source: None,
            },
            other => Self::ConnectionUnavailable {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_class_is_classified() {
        for code in ["23505", "23503", "23514", "23502"] {
            assert_eq!(classify_sqlstate(code), ErrorKind::ConstraintViolation, "{code}");
        }
    }

    #[test]
    fn connection_codes_are_classified() {
        for code in ["08006", "08001", "53300", "57P01"] {
            assert_eq!(classify_sqlstate(code), ErrorKind::ConnectionUnavailable, "{code}");
        }
    }

    #[test]
    fn cancel_and_lock_timeouts_are_classified() {
        assert_eq!(classify_sqlstate("57014"), ErrorKind::Timeout);
        assert_eq!(classify_sqlstate("55P03"), ErrorKind::Timeout);
    }

    #[test]
    fn undefined_names_are_invalid_identifiers() {
        assert_eq!(classify_sqlstate("42P01"), ErrorKind::InvalidIdentifier);
        assert_eq!(classify_sqlstate("42703"), ErrorKind::InvalidIdentifier);
    }

    #[test]
    fn unknown_codes_fall_through() {
        assert_eq!(classify_sqlstate("22012"), ErrorKind::Unknown);
        assert_eq!(classify_sqlstate("XX000"), ErrorKind::Unknown);
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(PgError::invalid_identifier("x").kind(), ErrorKind::InvalidIdentifier);
        assert_eq!(PgError::timeout(Duration::from_secs(1)).kind(), ErrorKind::Timeout);
        assert!(PgError::invalid_operator("x").is_validation());
        assert!(!PgError::unknown("boom").is_validation());
    }

    #[test]
    fn timeout_message_mentions_deadline() {
        let err = PgError::timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Timeout: statement exceeded 250ms");
    }

    #[test]
    fn closed_pool_is_connection_unavailable() {
        let err: PgError = deadpool_postgres::PoolError::Closed.into();
        assert_eq!(err.kind(), ErrorKind::ConnectionUnavailable);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn pool_wait_timeout_is_timeout() {
        use deadpool_postgres::{PoolError, TimeoutType};

        for kind in [TimeoutType::Wait, TimeoutType::Create, TimeoutType::Recycle] {
            let err: PgError = PoolError::Timeout(kind).into();
            assert!(err.is_timeout(), "{kind:?}");
            assert!(!err.is_validation());
        }
        let err: PgError = PoolError::Timeout(TimeoutType::Wait).into();
        assert_eq!(err.to_string(), "Timeout: pool Wait timeout");
    }

    #[test]
    fn no_runtime_is_connection_unavailable() {
        let err: PgError = deadpool_postgres::PoolError::NoRuntimeSpecified.into();
        assert_eq!(err.kind(), ErrorKind::ConnectionUnavailable);
    }

    #[tokio::test]
    async fn refused_connection_is_connection_unavailable() {
        // Nothing listens on port 1, so the driver fails with an I/O error.
        let driver_err = tokio_postgres::connect(
            "host=127.0.0.1 port=1 user=svc dbname=app connect_timeout=2",
            tokio_postgres::NoTls,
        )
        .await
        .err()
        .unwrap();
        assert!(driver_err.as_db_error().is_none());

        let err = PgError::from_db_error(driver_err);
        assert_eq!(err.kind(), ErrorKind::ConnectionUnavailable);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn driver_error_without_sqlstate_or_io_is_unknown() {
        let driver_err = "port=notaport"
            .parse::<tokio_postgres::Config>()
            .unwrap_err();

        let err = PgError::from_db_error(driver_err);
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(std::error::Error::source(&err).is_some());
    }
}
