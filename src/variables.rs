use crate::error::SqlMiddlewareDbError;
use crate::executor::{AsyncDatabaseExecutor, select_first_value};
use crate::types::RowValues;

/// Value of the global server variable `name`.
///
/// # Errors
///
/// Returns `SqlMiddlewareDbError::NoRows` when the variable does not exist, or the error of the
/// lookup.
pub async fn global_variable<E>(db: &E, name: &str) -> Result<String, SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let value = select_first_value(
        db,
        "SELECT VARIABLE_VALUE FROM performance_schema.global_variables WHERE VARIABLE_NAME = ?",
        &[RowValues::Text(name.to_string())],
    )
    .await?
    .ok_or(SqlMiddlewareDbError::NoRows)?;

    Ok(value.as_string_lossy().unwrap_or_default())
}
