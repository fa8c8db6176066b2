//! Control of the server's general query log.
//!
//! The general log records every statement the server receives; avoid enabling it on
//! production instances.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::Serialize;

use crate::error::SqlMiddlewareDbError;
use crate::executor::{AsyncDatabaseExecutor, with_read_timeout};
use crate::results::CustomDbRow;
use crate::types::RowValues;
use crate::variables::global_variable;

/// Most events [`general_log_events`] returns in one call.
pub const GENERAL_LOG_RESULT_HARD_LIMIT: usize = 1000;

/// Destination of the general and slow query logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum LogOutput {
    /// Logging disabled; wins over any other destination
    #[value(name = "NONE")]
    None,
    #[value(name = "FILE")]
    File,
    /// The `mysql.general_log` and `mysql.slow_log` tables
    #[value(name = "TABLE")]
    Table,
}

impl LogOutput {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogOutput::None => "NONE",
            LogOutput::File => "FILE",
            LogOutput::Table => "TABLE",
        }
    }
}

impl fmt::Display for LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogOutput {
    type Err = SqlMiddlewareDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogOutput as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| SqlMiddlewareDbError::ExecutionError(format!("unknown log output '{s}'")))
    }
}

/// One row of `mysql.general_log`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralLogEvent {
    pub time: NaiveDateTime,
    pub user_host: String,
    pub thread_id: i64,
    pub server_id: i64,
    pub command_type: String,
    pub argument: String,
}

impl GeneralLogEvent {
    fn from_row(row: &CustomDbRow) -> Result<Self, SqlMiddlewareDbError> {
        let missing = |column: &str| {
            SqlMiddlewareDbError::ExecutionError(format!("general log row without {column}"))
        };
        let text = |column: &'static str| {
            row.get(column)
                .and_then(RowValues::as_string_lossy)
                .ok_or_else(|| missing(column))
        };
        let int = |column: &'static str| {
            row.get(column)
                .and_then(RowValues::as_int)
                .copied()
                .ok_or_else(|| missing(column))
        };

        Ok(Self {
            time: row
                .get("event_time")
                .and_then(RowValues::as_timestamp)
                .ok_or_else(|| missing("event_time"))?,
            user_host: text("user_host")?,
            thread_id: int("thread_id")?,
            server_id: int("server_id")?,
            command_type: text("command_type")?,
            argument: text("argument")?,
        })
    }
}

/// Set the destinations of the general and slow query logs.
///
/// When [`LogOutput::None`] is among `outputs` it is the only destination set. Nothing is
/// done when `outputs` is empty.
///
/// # Errors
///
/// Returns the error of the `SET GLOBAL` statement.
pub async fn set_log_output<E>(db: &E, outputs: &[LogOutput]) -> Result<(), SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    if outputs.is_empty() {
        return Ok(());
    }

    let value = if outputs.contains(&LogOutput::None) {
        LogOutput::None.to_string()
    } else {
        let mut unique: Vec<&str> = Vec::with_capacity(outputs.len());
        for output in outputs {
            if !unique.contains(&output.as_str()) {
                unique.push(output.as_str());
            }
        }
        unique.join(",")
    };

    tracing::debug!(log_output = %value, "setting log output");
    db.execute_dml("SET GLOBAL log_output = ?", &[RowValues::Text(value)])
        .await?;
    Ok(())
}

/// Current destinations of the general and slow query logs.
///
/// # Errors
///
/// Returns an error when the variable cannot be read or holds an unknown destination.
pub async fn log_output<E>(db: &E) -> Result<Vec<LogOutput>, SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    global_variable(db, "log_output")
        .await?
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Turn on the general query log.
///
/// # Errors
///
/// Returns the error of the `SET GLOBAL` statement.
pub async fn enable_general_log<E>(db: &E) -> Result<(), SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    db.execute_dml("SET GLOBAL general_log = 'ON'", &[]).await?;
    Ok(())
}

/// Turn off the general query log.
///
/// # Errors
///
/// Returns the error of the `SET GLOBAL` statement.
pub async fn disable_general_log<E>(db: &E) -> Result<(), SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    db.execute_dml("SET GLOBAL general_log = 'OFF'", &[]).await?;
    Ok(())
}

/// Whether the general query log is on.
///
/// # Errors
///
/// Returns an error when the `general_log` variable cannot be read.
pub async fn general_query_log_enabled<E>(db: &E) -> Result<bool, SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    Ok(global_variable(db, "general_log").await? == "ON")
}

/// Events of the general query log, oldest first.
///
/// `arg_like`, when given, is a `LIKE` pattern the statement text must match. A `limit` of 0
/// or above [`GENERAL_LOG_RESULT_HARD_LIMIT`] is replaced by the hard limit. Only events
/// logged while [`LogOutput::Table`] was active can be read.
///
/// # Errors
///
/// Returns an error when the query fails, exceeds [`crate::executor::READ_TIMEOUT`], or
/// returns rows of an unexpected shape.
pub async fn general_log_events<E>(
    db: &E,
    arg_like: Option<&str>,
    limit: usize,
) -> Result<Vec<GeneralLogEvent>, SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let mut query = String::from(
        "SELECT event_time, user_host, thread_id, server_id, command_type, argument \
         FROM mysql.general_log",
    );

    let mut params = Vec::new();
    if let Some(pattern) = arg_like.filter(|p| !p.is_empty()) {
        query.push_str(" WHERE argument LIKE ?");
        params.push(RowValues::Text(pattern.to_string()));
    }

    let limit = if limit == 0 || limit > GENERAL_LOG_RESULT_HARD_LIMIT {
        GENERAL_LOG_RESULT_HARD_LIMIT
    } else {
        limit
    };
    query.push_str(&format!(" ORDER BY event_time ASC LIMIT {limit}"));

    let rs = with_read_timeout(db.execute_select(&query, &params)).await?;
    rs.results.iter().map(GeneralLogEvent::from_row).collect()
}

/// Flush the general log file and empty the `mysql.general_log` table.
///
/// The general log is off while this runs and is turned on again afterwards if it was on, also
/// when flushing or truncating fails.
///
/// # Errors
///
/// Returns the first error encountered.
pub async fn flush_general_log<E>(db: &E) -> Result<(), SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let enabled = general_query_log_enabled(db).await?;
    tracing::debug!(enabled, "flushing general log");

    if enabled {
        disable_general_log(db).await?;
    }

    let flushed = async {
        db.execute_dml("FLUSH GENERAL LOGS", &[]).await?;
        db.execute_dml("TRUNCATE TABLE mysql.general_log", &[]).await?;
        Ok::<(), SqlMiddlewareDbError>(())
    }
    .await;

    let restored = if enabled {
        enable_general_log(db).await
    } else {
        Ok(())
    };
    flushed.and(restored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_outputs() {
        assert_eq!("TABLE".parse::<LogOutput>().unwrap(), LogOutput::Table);
        assert_eq!("file".parse::<LogOutput>().unwrap(), LogOutput::File);
        assert!("SYSLOG".parse::<LogOutput>().is_err());
        assert_eq!(LogOutput::None.to_string(), "NONE");
    }
}
