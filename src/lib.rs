//! Convenience helpers atop a MySQL client.
//!
//! - [`template`]: `$(key)` substitution for the parts of a statement bind parameters cannot
//!   reach (schema and table names).
//! - [`dsn`]: parsing, editing and masking of MySQL DSNs.
//! - [`error`]: wrapping of driver errors with caller location and friendlier messages.
//! - [`schema`], [`table`], [`variables`] and [`server_logs`]: small administrative helpers
//!   that run against any [`executor::AsyncDatabaseExecutor`].
//!
//! The `mysql` feature (on by default) provides [`mysql::ConfigAndPool`], a `sqlx` pool
//! implementing the executor trait.
//!
//! ```rust
//! use mysql_middleware::prelude::*;
//!
//! let sql = must_substitute("CREATE SCHEMA $(name)", &["name", "shop"]);
//! assert_eq!(sql, "CREATE SCHEMA shop");
//!
//! let dsn = replace_dsn_database("app:secret@tcp(db:3306)/", "shop")?;
//! assert_eq!(mask_password_in_dsn(&dsn), "app:********@tcp(db:3306)/shop");
//! # Ok::<(), DsnError>(())
//! ```

pub mod dsn;
pub mod error;
pub mod executor;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod prelude;
pub mod results;
pub mod schema;
pub mod server_logs;
pub mod table;
pub mod template;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod variables;

pub use error::SqlMiddlewareDbError;
pub use template::{must_substitute, substitute};
