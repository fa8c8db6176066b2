//! Creating, dropping and inspecting schemas (databases).

use crate::error::SqlMiddlewareDbError;
use crate::executor::{AsyncDatabaseExecutor, select_first_value};
use crate::template::substitute;
use crate::types::RowValues;

/// Create schema `name`.
///
/// # Errors
///
/// Returns `SqlMiddlewareDbError::Database` when the server refuses; an existing schema can be
/// recognized with [`crate::error::is_db_create_exists`].
pub async fn create_schema<E>(db: &E, name: &str) -> Result<(), SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let ddl = substitute("CREATE SCHEMA $(name)", &["name", name])?;
    db.execute_dml(&ddl, &[]).await?;
    Ok(())
}

/// Drop schema `name`.
///
/// # Errors
///
/// Returns `SqlMiddlewareDbError::Database` when the server refuses, for example with
/// [`crate::error::ER_DB_DROP_EXISTS`] when the schema does not exist.
pub async fn drop_schema<E>(db: &E, name: &str) -> Result<(), SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let ddl = substitute("DROP SCHEMA $(name)", &["name", name])?;
    db.execute_dml(&ddl, &[]).await?;
    Ok(())
}

/// Whether a schema called `name` exists.
///
/// # Errors
///
/// Returns an error when the lookup fails or exceeds [`crate::executor::READ_TIMEOUT`].
pub async fn schema_exists<E>(db: &E, name: &str) -> Result<bool, SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let found = select_first_value(
        db,
        "SELECT 1 FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?",
        &[RowValues::Text(name.to_string())],
    )
    .await?;
    Ok(found.is_some())
}

/// Name of the current schema, or an empty string when none is selected.
///
/// # Errors
///
/// Returns an error when the lookup fails or exceeds [`crate::executor::READ_TIMEOUT`].
pub async fn current_schema<E>(db: &E) -> Result<String, SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let value = select_first_value(db, "SELECT SCHEMA()", &[])
        .await?
        .ok_or(SqlMiddlewareDbError::NoRows)?;
    Ok(value.as_string_lossy().unwrap_or_default())
}
