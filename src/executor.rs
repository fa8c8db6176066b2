use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SqlMiddlewareDbError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Upper bound for the lookups issued by the schema, table and variable helpers.
pub const READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Anything the helpers of this crate can run statements against.
#[async_trait]
pub trait AsyncDatabaseExecutor: Send + Sync {
    /// Executes one or more statements without parameters.
    async fn execute_batch(&self, query: &str) -> Result<(), SqlMiddlewareDbError>;

    /// Executes a single SELECT statement and returns the result set.
    async fn execute_select(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlMiddlewareDbError>;

    /// Executes a single statement (DDL, INSERT, UPDATE, SET, ...) and returns the number of
    /// rows affected.
    async fn execute_dml(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<u64, SqlMiddlewareDbError>;
}

/// Run `fut`, giving up after [`READ_TIMEOUT`].
///
/// # Errors
///
/// Returns `SqlMiddlewareDbError::Timeout` on expiry, or the error of `fut`.
pub async fn with_read_timeout<T, F>(fut: F) -> Result<T, SqlMiddlewareDbError>
where
    F: Future<Output = Result<T, SqlMiddlewareDbError>>,
{
    tokio::time::timeout(READ_TIMEOUT, fut)
        .await
        .map_err(|_| SqlMiddlewareDbError::Timeout(READ_TIMEOUT))?
}

/// Select with a bounded timeout, returning the first column of the first row.
pub(crate) async fn select_first_value<E>(
    db: &E,
    query: &str,
    params: &[RowValues],
) -> Result<Option<RowValues>, SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let rs = with_read_timeout(db.execute_select(query, params)).await?;
    Ok(rs.first_value().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn read_timeout_expires() {
        let res: Result<(), _> = with_read_timeout(async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert!(matches!(res, Err(SqlMiddlewareDbError::Timeout(d)) if d == READ_TIMEOUT));
    }

    #[tokio::test]
    async fn read_timeout_passes_result() {
        let res = with_read_timeout(async { Ok::<_, SqlMiddlewareDbError>(7) }).await;
        assert_eq!(res.unwrap(), 7);
    }
}
