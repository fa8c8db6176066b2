use std::fmt;
use std::panic::Location;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

use crate::dsn::DsnError;
use crate::template::TemplateError;
use crate::types::RowValues;

/// Server error: `CREATE SCHEMA` on a schema that already exists.
pub const ER_DB_CREATE_EXISTS: u16 = 1007;
/// Server error: `DROP SCHEMA` on a schema that does not exist.
pub const ER_DB_DROP_EXISTS: u16 = 1008;
/// Server error: duplicate entry for a unique key.
pub const ER_DUP_ENTRY: u16 = 1062;
/// Client error: the server host could not be reached.
pub const CR_CONN_HOST_ERROR: u16 = 2005;

static RE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'(.*?)'").expect("valid regex"));

#[derive(Debug, Error)]
pub enum SqlMiddlewareDbError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Dsn(#[from] DsnError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("No rows returned")]
    NoRows,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

/// Error as reported by the MySQL driver, before any rewording.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Error returned by the server.
    #[error("Error {number} ({}): {message}", .sql_state.as_deref().unwrap_or("HY000"))]
    Server {
        number: u16,
        sql_state: Option<String>,
        message: String,
    },

    /// The TCP connection or unix socket was refused.
    #[error("connect: {source}")]
    ConnectionRefused {
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl DriverError {
    /// MySQL error number, when the driver reported one.
    #[must_use]
    pub fn number(&self) -> Option<u16> {
        match self {
            DriverError::Server { number, .. } => Some(*number),
            DriverError::ConnectionRefused { .. } => Some(CR_CONN_HOST_ERROR),
            DriverError::Other(_) => None,
        }
    }

    fn message(&self) -> String {
        match self {
            DriverError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// A driver error together with where it was wrapped and what was being run.
///
/// The `Display` implementation rewrites a few well-known server errors into friendlier
/// messages:
///
/// ```rust
/// use mysql_middleware::prelude::*;
///
/// let err = DbError::new(DriverError::Server {
///     number: ER_DB_CREATE_EXISTS,
///     sql_state: Some("HY000".into()),
///     message: "Can't create database 'shop'; database exists".into(),
/// });
/// assert_eq!(err.to_string(), "schema 'shop' not available");
/// ```
#[derive(Debug)]
pub struct DbError {
    message: Option<String>,
    driver: Option<DriverError>,
    query: Option<String>,
    values: Vec<RowValues>,
    host: Option<String>,
    file: &'static str,
    line: u32,
    number: Option<u16>,
}

impl DbError {
    /// Wrap `driver`, recording the caller's file and line.
    #[must_use]
    #[track_caller]
    pub fn new(driver: impl Into<DriverError>) -> Self {
        let driver = driver.into();
        let location = Location::caller();
        Self {
            message: None,
            number: driver.number(),
            driver: Some(driver),
            query: None,
            values: Vec::new(),
            host: None,
            file: location.file(),
            line: location.line(),
        }
    }

    /// Wrap `driver` but report `message` instead of the driver's text.
    #[must_use]
    #[track_caller]
    pub fn with_message(driver: impl Into<DriverError>, message: impl Into<String>) -> Self {
        let mut err = Self::new(driver);
        err.message = Some(message.into());
        err
    }

    /// Wrap `driver` keeping the query and its values.
    ///
    /// Values may hold sensitive data; use this while debugging only.
    #[must_use]
    #[track_caller]
    pub fn with_query(
        driver: impl Into<DriverError>,
        query: impl Into<String>,
        values: Vec<RowValues>,
    ) -> Self {
        let mut err = Self::new(driver);
        err.query = Some(query.into());
        err.values = values;
        err
    }

    #[must_use]
    #[track_caller]
    pub fn tx_begin(driver: impl Into<DriverError>) -> Self {
        Self::with_message(driver, "failed starting transaction")
    }

    #[must_use]
    #[track_caller]
    pub fn tx_commit(driver: impl Into<DriverError>) -> Self {
        Self::with_message(driver, "failed committing transaction")
    }

    /// Record the server host the failed connection was attempted against.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn number(&self) -> Option<u16> {
        self.number
    }

    #[must_use]
    pub fn driver_error(&self) -> Option<&DriverError> {
        self.driver.as_ref()
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    #[must_use]
    pub fn file(&self) -> &'static str {
        self.file
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Whether this wraps a driver error with the given MySQL error number.
    #[must_use]
    pub fn is(&self, number: u16) -> bool {
        self.driver.is_some() && self.number == Some(number)
    }

    fn describe(&self) -> String {
        if let Some(DriverError::ConnectionRefused { source }) = &self.driver {
            let host = self.host.as_deref().unwrap_or("<unknown>");
            return format!("unknown MySQL server host '{host}' ({source}) [2005:HY000]");
        }

        let msg = match (&self.message, &self.driver) {
            (Some(message), _) => message.clone(),
            (None, Some(driver)) => driver.message(),
            (None, None) => "unknown MySQL error".to_string(),
        };

        let Some(number) = self.number else {
            return msg;
        };

        let normalized = msg.replace("an't", "annot").replace("oesn't", "oes not");
        let quoted = first_quoted(&normalized);
        match (number, quoted) {
            (ER_DB_CREATE_EXISTS, Some(name)) => format!("schema '{name}' not available"),
            (ER_DB_DROP_EXISTS, Some(name)) => format!("schema '{name}' does not exist"),
            (ER_DUP_ENTRY, Some(value)) => format!("'{value}' not available"),
            (ER_DB_CREATE_EXISTS | ER_DB_DROP_EXISTS | ER_DUP_ENTRY, None) => normalized,
            _ if self.message.is_none() => msg.to_lowercase(),
            _ => msg,
        }
    }
}

fn first_quoted(message: &str) -> Option<&str> {
    RE_QUOTED
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl std::error::Error for DbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.driver
            .as_ref()
            .map(|driver| driver as &(dyn std::error::Error + 'static))
    }
}

/// Whether `err` wraps a driver error with the given MySQL error number.
#[must_use]
pub fn error_is(err: &SqlMiddlewareDbError, number: u16) -> bool {
    matches!(err, SqlMiddlewareDbError::Database(db_err) if db_err.is(number))
}

/// Whether `err` is the server refusing to create an existing schema.
#[must_use]
pub fn is_db_create_exists(err: &SqlMiddlewareDbError) -> bool {
    error_is(err, ER_DB_CREATE_EXISTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(number: u16, message: &str) -> DriverError {
        DriverError::Server {
            number,
            sql_state: Some("HY000".to_string()),
            message: message.to_string(),
        }
    }

    #[test]
    fn lowercases_unhandled_server_errors() {
        let err = DbError::new(server(1046, "No database selected"));
        assert_eq!(err.to_string(), "no database selected");
        assert_eq!(err.number(), Some(1046));
    }

    #[test]
    fn rewrites_well_known_errors() {
        let err = DbError::new(server(
            ER_DB_CREATE_EXISTS,
            "Can't create database 'shop'; database exists",
        ));
        assert_eq!(err.to_string(), "schema 'shop' not available");

        let err = DbError::new(server(
            ER_DB_DROP_EXISTS,
            "Can't drop database 'shop'; database doesn't exist",
        ));
        assert_eq!(err.to_string(), "schema 'shop' does not exist");

        let err = DbError::new(server(
            ER_DUP_ENTRY,
            "Duplicate entry 'alice' for key 'users.PRIMARY'",
        ));
        assert_eq!(err.to_string(), "'alice' not available");
    }

    #[test]
    fn normalizes_when_no_quoted_name() {
        let err = DbError::new(server(ER_DB_DROP_EXISTS, "Database doesn't exist"));
        assert_eq!(err.to_string(), "Database does not exist");

        let err = DbError::new(server(ER_DB_CREATE_EXISTS, "Can't create database; it doesn't fit"));
        assert_eq!(err.to_string(), "Cannot create database; it does not fit");
    }

    #[test]
    fn custom_message_is_kept() {
        let err = DbError::tx_begin(server(1205, "Lock wait timeout exceeded"));
        assert_eq!(err.to_string(), "failed starting transaction");
        assert!(err.is(1205));
    }

    #[test]
    fn connection_refused_names_host() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = DbError::new(DriverError::ConnectionRefused { source: io })
            .with_host("127.0.0.1:12345");
        assert_eq!(
            err.to_string(),
            "unknown MySQL server host '127.0.0.1:12345' (connection refused) [2005:HY000]"
        );
        assert!(err.is(CR_CONN_HOST_ERROR));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = DbError::new(DriverError::ConnectionRefused { source: io });
        assert!(err.to_string().starts_with("unknown MySQL server host '<unknown>'"));
    }

    #[test]
    fn records_caller_location() {
        let err = DbError::new(server(1046, "No database selected"));
        assert!(err.file().ends_with("error.rs"));
        assert!(err.line() > 0);
    }

    #[test]
    fn keeps_query_and_values() {
        let err = DbError::with_query(
            server(1146, "Table 'shop.t9' doesn't exist"),
            "SELECT * FROM t9 WHERE id = ?",
            vec![RowValues::Int(7)],
        );
        assert_eq!(err.query(), Some("SELECT * FROM t9 WHERE id = ?"));
        assert_eq!(err.values(), &[RowValues::Int(7)]);
        assert_eq!(err.to_string(), "table 'shop.t9' doesn't exist");
    }

    #[test]
    fn error_is_matches_only_database_errors() {
        let err: SqlMiddlewareDbError = DbError::new(server(ER_DB_CREATE_EXISTS, "x")).into();
        assert!(is_db_create_exists(&err));
        assert!(!error_is(&err, ER_DUP_ENTRY));
        assert!(!error_is(&SqlMiddlewareDbError::NoRows, ER_DB_CREATE_EXISTS));
    }

    #[test]
    fn unknown_driver_error_passes_through() {
        let err = DbError::new(DriverError::Other("pool closed".into()));
        assert_eq!(err.to_string(), "pool closed");
        assert_eq!(err.number(), None);
    }
}
