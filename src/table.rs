//! Table lookups and table comments.
//!
//! Functions taking a `schema` use the current schema when it is `None` or empty.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::SqlMiddlewareDbError;
use crate::executor::{AsyncDatabaseExecutor, select_first_value};
use crate::schema::current_schema;
use crate::template::substitute;
use crate::types::RowValues;

/// Whether table `name` exists in the current schema.
///
/// # Errors
///
/// Returns an error when a lookup fails or exceeds [`crate::executor::READ_TIMEOUT`].
pub async fn table_exists<E>(db: &E, name: &str) -> Result<bool, SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let schema = current_schema(db).await?;
    let found = select_first_value(
        db,
        "SELECT 1 FROM information_schema.TABLES WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?",
        &[RowValues::Text(schema), RowValues::Text(name.to_string())],
    )
    .await?;
    Ok(found.is_some())
}

/// Comment of `table`.
///
/// # Errors
///
/// Returns `SqlMiddlewareDbError::NoRows` when the table does not exist.
pub async fn table_comment<E>(
    db: &E,
    table: &str,
    schema: Option<&str>,
) -> Result<String, SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let mut params = vec![RowValues::Text(table.to_string())];
    let query = match schema.filter(|s| !s.is_empty()) {
        Some(schema) => {
            params.push(RowValues::Text(schema.to_string()));
            "SELECT TABLE_COMMENT FROM information_schema.TABLES \
             WHERE TABLE_NAME = ? AND TABLE_SCHEMA = ?"
        }
        None => {
            "SELECT TABLE_COMMENT FROM information_schema.TABLES \
             WHERE TABLE_NAME = ? AND TABLE_SCHEMA = SCHEMA()"
        }
    };

    let value = select_first_value(db, query, &params)
        .await?
        .ok_or(SqlMiddlewareDbError::NoRows)?;
    Ok(value.as_string_lossy().unwrap_or_default())
}

/// Comment of `table` deserialized from JSON.
///
/// # Errors
///
/// Returns `SqlMiddlewareDbError::Json` when the comment does not deserialize into `T`, or any
/// error of [`table_comment`].
pub async fn table_comment_json<T, E>(
    db: &E,
    table: &str,
    schema: Option<&str>,
) -> Result<T, SqlMiddlewareDbError>
where
    T: DeserializeOwned,
    E: AsyncDatabaseExecutor + ?Sized,
{
    let comment = table_comment(db, table, schema).await?;
    Ok(serde_json::from_str(&comment)?)
}

/// Set the comment of `table`.
///
/// The comment is sent as a string literal escaped for the default SQL mode; with
/// `NO_BACKSLASH_ESCAPES` enabled, comments containing `\` are stored with doubled backslashes.
///
/// # Errors
///
/// Returns the error of the `ALTER TABLE` statement.
pub async fn set_table_comment<E>(
    db: &E,
    table: &str,
    comment: &str,
    schema: Option<&str>,
) -> Result<(), SqlMiddlewareDbError>
where
    E: AsyncDatabaseExecutor + ?Sized,
{
    let target = match schema.filter(|s| !s.is_empty()) {
        Some(schema) => substitute("$(schema).$(table)", &["schema", schema, "table", table])?,
        None => table.to_string(),
    };
    let ddl = substitute(
        "ALTER TABLE $(table) COMMENT = $(comment)",
        &["table", target.as_str(), "comment", quote_literal(comment).as_str()],
    )?;

    db.execute_dml(&ddl, &[]).await?;
    Ok(())
}

/// Set the comment of `table` to `comment` serialized as JSON.
///
/// # Errors
///
/// Returns `SqlMiddlewareDbError::Json` when `comment` cannot be serialized, or any error of
/// [`set_table_comment`].
pub async fn set_table_comment_json<T, E>(
    db: &E,
    table: &str,
    comment: &T,
    schema: Option<&str>,
) -> Result<(), SqlMiddlewareDbError>
where
    T: Serialize + ?Sized,
    E: AsyncDatabaseExecutor + ?Sized,
{
    let data = serde_json::to_string(comment)?;
    set_table_comment(db, table, &data, schema).await
}

/// Quote `value` as a MySQL string literal.
///
/// Backslashes are doubled, which assumes the default SQL mode. Under `NO_BACKSLASH_ESCAPES`
/// each backslash of `value` ends up twice in the stored text.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}
