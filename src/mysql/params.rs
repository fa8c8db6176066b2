use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;

use crate::types::RowValues;

/// Bind `params` positionally to the `?` placeholders of `query`.
pub(crate) fn bind_query_params<'q>(
    query: &'q str,
    params: &[RowValues],
) -> Query<'q, MySql, MySqlArguments> {
    let mut query = sqlx::query(query);

    for param in params {
        query = match param {
            RowValues::Int(i) => query.bind(*i),
            RowValues::Float(f) => query.bind(*f),
            RowValues::Text(s) => query.bind(s.clone()),
            RowValues::Bool(b) => query.bind(*b),
            RowValues::Timestamp(dt) => query.bind(*dt),
            RowValues::Null => query.bind(Option::<String>::None),
            RowValues::JSON(jsval) => query.bind(jsval.to_string()),
            RowValues::Blob(bytes) => query.bind(bytes.clone()),
        };
    }

    query
}
