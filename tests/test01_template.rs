use mysql_middleware::prelude::*;

#[test]
fn template_builds_ddl_for_runtime_names() {
    let schema = "shop";
    let table = "orders";

    let ddl = must_substitute(
        "CREATE TABLE $(schema).$(table) (id INT PRIMARY KEY, note VARCHAR(20) DEFAULT '$(table)')",
        &["schema", schema, "table", table],
    );
    assert_eq!(
        ddl,
        "CREATE TABLE shop.orders (id INT PRIMARY KEY, note VARCHAR(20) DEFAULT '$(table)')"
    );
}

#[test]
fn template_accepts_owned_pairs() {
    let pairs: Vec<String> = vec!["tblName".into(), format!("t{}", 1)];
    let sql = substitute("SELECT 1 AS $(tblName)_value FROM $(tblName)", &pairs).unwrap();
    assert_eq!(sql, "SELECT 1 AS t1_value FROM t1");
}

#[test]
fn template_errors_convert_into_middleware_errors() {
    fn build() -> Result<String, SqlMiddlewareDbError> {
        Ok(substitute("SELECT 1 FROM $(tblName", &["tblName", "t1"])?)
    }

    let err = build().unwrap_err();
    assert!(matches!(
        err,
        SqlMiddlewareDbError::Template(TemplateError::UnclosedSubstitution { position: 14 })
    ));
    assert_eq!(err.to_string(), "unclosed substitution at position 14");
}

#[test]
fn template_reports_missing_values_in_order() {
    let err = substitute("SELECT $(b), $(a) FROM $(c)", &["c", "t"]).unwrap_err();
    assert_eq!(err.to_string(), "key/value missing for a,b");
}

#[test]
#[should_panic(expected = "placeholder missing for unused")]
fn must_substitute_panics_on_unused_value() {
    let _ = must_substitute("SELECT 1", &["unused", "x"]);
}
