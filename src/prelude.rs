//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::dsn::{
    DSN_PASSWORD_MASK, Dsn, DsnError, mask_password_in_dsn, replace_dsn_database, set_dsn_params,
};
pub use crate::error::{
    CR_CONN_HOST_ERROR, DbError, DriverError, ER_DB_CREATE_EXISTS, ER_DB_DROP_EXISTS,
    ER_DUP_ENTRY, SqlMiddlewareDbError, error_is, is_db_create_exists,
};
pub use crate::executor::{AsyncDatabaseExecutor, READ_TIMEOUT, with_read_timeout};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::schema::{create_schema, current_schema, drop_schema, schema_exists};
pub use crate::server_logs::{
    GENERAL_LOG_RESULT_HARD_LIMIT, GeneralLogEvent, LogOutput, disable_general_log,
    enable_general_log, flush_general_log, general_log_events, general_query_log_enabled,
    log_output, set_log_output,
};
pub use crate::table::{
    set_table_comment, set_table_comment_json, table_comment, table_comment_json, table_exists,
};
pub use crate::template::{TemplateError, must_substitute, substitute};
pub use crate::types::RowValues;
pub use crate::variables::global_variable;

#[cfg(feature = "mysql")]
pub use crate::mysql::{ConfigAndPool, DSN_ENV_VAR, MysqlOptions, MysqlOptionsBuilder};
