//! `sqlx`-backed MySQL executor.

mod config;
mod executor;
mod params;
mod query;

pub use config::{ConfigAndPool, DSN_ENV_VAR, MysqlOptions, MysqlOptionsBuilder};
pub use executor::driver_error;
