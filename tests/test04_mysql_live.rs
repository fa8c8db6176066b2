#![cfg(feature = "mysql")]

use std::time::Duration;

use mysql_middleware::prelude::*;
use tokio::runtime::Runtime;

/// Pool for the server named by `MYSQL_MIDDLEWARE_DSN`, or `None` to skip.
async fn live_pool() -> Result<Option<ConfigAndPool>, SqlMiddlewareDbError> {
    if std::env::var(DSN_ENV_VAR).is_err() {
        eprintln!("{DSN_ENV_VAR} not set; skipping live MySQL test");
        return Ok(None);
    }
    let opts = MysqlOptions::from_env()?.with_max_connections(2);
    Ok(Some(ConfigAndPool::new_mysql(opts).await?))
}

#[test]
fn unreachable_server_reports_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let dsn = Dsn::parse("app:secret@tcp(127.0.0.1:1)/shop")?;
        let db = ConfigAndPool::mysql_builder(dsn)
            .acquire_timeout(Duration::from_millis(200))
            .build()
            .await?;
        assert_eq!(db.host(), "127.0.0.1:1");

        let err = schema_exists(&db, "shop").await.unwrap_err();
        assert!(!matches!(err, SqlMiddlewareDbError::NoRows));
        assert!(!err.to_string().contains("secret"));
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[test]
fn unsupported_network_is_a_config_error() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let opts = MysqlOptions::from_dsn("app:secret@pipe(mysql)/shop")?;
        let err = ConfigAndPool::new_mysql(opts).await.unwrap_err();
        assert!(matches!(err, SqlMiddlewareDbError::ConfigError(_)));
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[test]
fn live_schema_and_table_helpers() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let Some(db) = live_pool().await? else {
            return Ok(());
        };

        let schema = "mysql_middleware_test04";
        if schema_exists(&db, schema).await? {
            drop_schema(&db, schema).await?;
        }
        create_schema(&db, schema).await?;
        assert!(schema_exists(&db, schema).await?);

        let err = create_schema(&db, schema).await.unwrap_err();
        assert!(is_db_create_exists(&err));
        assert_eq!(err.to_string(), format!("schema '{schema}' not available"));

        let ddl = must_substitute(
            "CREATE TABLE $(schema).t1 (id INT PRIMARY KEY, name VARCHAR(20))",
            &["schema", schema],
        );
        db.execute_batch(&ddl).await?;

        let insert = must_substitute(
            "INSERT INTO $(schema).t1 (id, name) VALUES (?, ?)",
            &["schema", schema],
        );
        let affected = db
            .execute_dml(&insert, &[RowValues::Int(1), RowValues::Text("alice".into())])
            .await?;
        assert_eq!(affected, 1);

        let err = db
            .execute_dml(&insert, &[RowValues::Int(1), RowValues::Text("bob".into())])
            .await
            .unwrap_err();
        assert!(error_is(&err, ER_DUP_ENTRY));
        assert_eq!(err.to_string(), "'1' not available");

        set_table_comment(&db, "t1", "I am comment", Some(schema)).await?;
        assert_eq!(table_comment(&db, "t1", Some(schema)).await?, "I am comment");

        let rs = db
            .execute_select(
                &must_substitute("SELECT id, name FROM $(schema).t1", &["schema", schema]),
                &[],
            )
            .await?;
        assert_eq!(rs.results.len(), 1);
        assert_eq!(rs.results[0].get("name").and_then(RowValues::as_text), Some("alice"));

        drop_schema(&db, schema).await?;
        let err = drop_schema(&db, schema).await.unwrap_err();
        assert!(error_is(&err, ER_DB_DROP_EXISTS));
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
