use async_trait::async_trait;
use sqlx::mysql::MySqlDatabaseError;

use super::config::ConfigAndPool;
use super::params::bind_query_params;
use super::query::build_result_set;
use crate::error::{DbError, DriverError, SqlMiddlewareDbError};
use crate::executor::AsyncDatabaseExecutor;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Convert a `sqlx` error into the driver-neutral [`DriverError`].
#[must_use]
pub fn driver_error(err: sqlx::Error) -> DriverError {
    match err {
        sqlx::Error::Database(db_err) => {
            if let Some(mysql_err) = db_err.try_downcast_ref::<MySqlDatabaseError>() {
                return DriverError::Server {
                    number: mysql_err.number(),
                    sql_state: mysql_err.code().map(str::to_string),
                    message: mysql_err.message().to_string(),
                };
            }
            DriverError::Other(Box::new(sqlx::Error::Database(db_err)))
        }
        sqlx::Error::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
            DriverError::ConnectionRefused { source: io }
        }
        other => DriverError::Other(Box::new(other)),
    }
}

impl From<sqlx::Error> for DriverError {
    fn from(err: sqlx::Error) -> Self {
        driver_error(err)
    }
}

impl ConfigAndPool {
    #[track_caller]
    fn wrap_error(&self, err: sqlx::Error) -> SqlMiddlewareDbError {
        match err {
            sqlx::Error::RowNotFound => SqlMiddlewareDbError::NoRows,
            other => DbError::new(other)
                .with_host(self.host())
                .into(),
        }
    }
}

#[async_trait]
impl AsyncDatabaseExecutor for ConfigAndPool {
    async fn execute_batch(&self, query: &str) -> Result<(), SqlMiddlewareDbError> {
        tracing::debug!(query, "mysql execute_batch");
        sqlx::raw_sql(query)
            .execute(&self.pool)
            .await
            .map_err(|e| self.wrap_error(e))?;
        Ok(())
    }

    async fn execute_select(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlMiddlewareDbError> {
        tracing::debug!(query, params = params.len(), "mysql execute_select");
        let rows = bind_query_params(query, params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.wrap_error(e))?;
        Ok(build_result_set(&rows))
    }

    async fn execute_dml(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<u64, SqlMiddlewareDbError> {
        tracing::debug!(query, params = params.len(), "mysql execute_dml");
        // some administrative statements cannot be prepared; without parameters there is no need
        let result = if params.is_empty() {
            sqlx::raw_sql(query).execute(&self.pool).await
        } else {
            bind_query_params(query, params).execute(&self.pool).await
        };
        Ok(result.map_err(|e| self.wrap_error(e))?.rows_affected())
    }
}
