use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::dsn::{Dsn, mask_password_in_dsn};
use crate::error::SqlMiddlewareDbError;

/// Environment variable read by [`MysqlOptions::from_env`].
pub const DSN_ENV_VAR: &str = "MYSQL_MIDDLEWARE_DSN";

/// Options for configuring a MySQL pool.
#[derive(Debug, Clone)]
pub struct MysqlOptions {
    pub dsn: Dsn,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl MysqlOptions {
    #[must_use]
    pub fn new(dsn: Dsn) -> Self {
        Self {
            dsn,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(3),
        }
    }

    /// Options for the connection described by the DSN string `dsn`.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::Dsn` if `dsn` cannot be parsed.
    pub fn from_dsn(dsn: &str) -> Result<Self, SqlMiddlewareDbError> {
        Ok(Self::new(Dsn::parse(dsn)?))
    }

    /// Options for the DSN found in the `MYSQL_MIDDLEWARE_DSN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError::ConfigError` if the variable is not set, or
    /// `SqlMiddlewareDbError::Dsn` if it cannot be parsed.
    pub fn from_env() -> Result<Self, SqlMiddlewareDbError> {
        let dsn = std::env::var(DSN_ENV_VAR).map_err(|e| {
            SqlMiddlewareDbError::ConfigError(format!("{DSN_ENV_VAR} not usable: {e}"))
        })?;
        Self::from_dsn(&dsn)
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }
}

/// Fluent builder for MySQL options.
#[derive(Debug, Clone)]
pub struct MysqlOptionsBuilder {
    opts: MysqlOptions,
}

impl MysqlOptionsBuilder {
    #[must_use]
    pub fn new(dsn: Dsn) -> Self {
        Self {
            opts: MysqlOptions::new(dsn),
        }
    }

    #[must_use]
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.opts.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.opts.acquire_timeout = acquire_timeout;
        self
    }

    #[must_use]
    pub fn finish(self) -> MysqlOptions {
        self.opts
    }

    /// Build a `ConfigAndPool` for MySQL.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError` if the DSN cannot be turned into connect options.
    pub async fn build(self) -> Result<ConfigAndPool, SqlMiddlewareDbError> {
        ConfigAndPool::new_mysql(self.finish()).await
    }
}

/// Configuration and connection pool for a MySQL server.
#[derive(Debug, Clone)]
pub struct ConfigAndPool {
    /// The connection pool
    pub pool: MySqlPool,
    pub options: MysqlOptions,
}

impl ConfigAndPool {
    #[must_use]
    pub fn mysql_builder(dsn: Dsn) -> MysqlOptionsBuilder {
        MysqlOptionsBuilder::new(dsn)
    }

    /// Asynchronous initializer for `ConfigAndPool` with MySQL.
    ///
    /// Connections are opened on first use, so an unreachable server is reported by the first
    /// statement rather than here.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ConfigError` if the DSN uses an unsupported network or an
    /// invalid address.
    #[allow(clippy::unused_async)]
    pub async fn new_mysql(opts: MysqlOptions) -> Result<Self, SqlMiddlewareDbError> {
        let connect_options = build_connect_options(&opts.dsn)?;

        tracing::info!(
            dsn = %mask_password_in_dsn(&opts.dsn.to_string()),
            max_connections = opts.max_connections,
            "creating MySQL pool"
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(opts.acquire_timeout)
            .connect_lazy_with(connect_options);

        Ok(ConfigAndPool {
            pool,
            options: opts,
        })
    }

    /// Server address connections are made to, as given in the DSN.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.options.dsn.addr
    }
}

fn build_connect_options(dsn: &Dsn) -> Result<MySqlConnectOptions, SqlMiddlewareDbError> {
    let mut options = MySqlConnectOptions::new().username(&dsn.user);

    match dsn.net.as_str() {
        "tcp" => {
            let (host, port) = dsn.tcp_host_port().ok_or_else(|| {
                SqlMiddlewareDbError::ConfigError(format!("invalid tcp address '{}'", dsn.addr))
            })?;
            options = options.host(host).port(port);
        }
        "unix" => options = options.socket(&dsn.addr),
        other => {
            return Err(SqlMiddlewareDbError::ConfigError(format!(
                "unsupported network '{other}'"
            )));
        }
    }

    if !dsn.password.is_empty() {
        options = options.password(&dsn.password);
    }
    if !dsn.db_name.is_empty() {
        options = options.database(&dsn.db_name);
    }

    for (key, value) in &dsn.params {
        match key.as_str() {
            // the driver accepts a preference list; the first entry wins
            "charset" => {
                if let Some(charset) = value.split(',').next() {
                    options = options.charset(charset);
                }
            }
            "collation" => options = options.collation(value),
            _ => tracing::debug!(param = %key, "DSN parameter not used for connecting"),
        }
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_network() {
        let dsn = Dsn {
            net: "pipe".into(),
            addr: "x".into(),
            ..Dsn::default()
        };
        assert!(matches!(
            build_connect_options(&dsn),
            Err(SqlMiddlewareDbError::ConfigError(_))
        ));
    }

    #[test]
    fn builds_tcp_and_socket_options() {
        let dsn = Dsn::parse("root:mysql@tcp(127.0.0.1:13399)/shop?charset=utf8mb4,utf8").unwrap();
        assert!(build_connect_options(&dsn).is_ok());

        let dsn = Dsn::parse("root@unix(/var/run/mysqld/mysqld.sock)/").unwrap();
        assert!(build_connect_options(&dsn).is_ok());
    }

    #[test]
    fn builder_sets_limits() {
        let opts = ConfigAndPool::mysql_builder(Dsn::parse("u@/db").unwrap())
            .max_connections(2)
            .acquire_timeout(Duration::from_millis(500))
            .finish();
        assert_eq!(opts.max_connections, 2);
        assert_eq!(opts.acquire_timeout, Duration::from_millis(500));
        assert_eq!(opts.dsn.addr, "127.0.0.1:3306");
    }

    #[tokio::test]
    async fn pool_is_created_lazily() {
        let opts = MysqlOptions::from_dsn("root:mysql@tcp(127.0.0.1:1)/").unwrap();
        let cap = ConfigAndPool::new_mysql(opts).await.unwrap();
        assert_eq!(cap.host(), "127.0.0.1:1");
        assert_eq!(cap.pool.size(), 0);
    }
}
