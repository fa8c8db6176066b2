use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo};

use crate::results::ResultSet;
use crate::types::RowValues;

/// Build a result set from the rows of a MySQL query.
pub(crate) fn build_result_set(rows: &[MySqlRow]) -> ResultSet {
    let mut result_set = ResultSet::with_capacity(rows.len());

    let Some(first) = rows.first() else {
        return result_set;
    };
    let column_names: Vec<String> = first
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let values = (0..row.len()).map(|idx| extract_value(row, idx)).collect();
        result_set.add_row_values(values);
    }

    result_set
}

/// Extract the value at `idx`, trying the decodings MySQL columns commonly need.
fn extract_value(row: &MySqlRow, idx: usize) -> RowValues {
    if let Ok(val) = row.try_get::<Option<i64>, _>(idx) {
        return val.map_or(RowValues::Null, RowValues::Int);
    }

    // unsigned columns, e.g. thread ids
    if let Ok(val) = row.try_get::<Option<u64>, _>(idx) {
        return match val {
            None => RowValues::Null,
            Some(u) => i64::try_from(u).map_or_else(|_| RowValues::Text(u.to_string()), RowValues::Int),
        };
    }

    if let Ok(val) = row.try_get::<Option<f64>, _>(idx) {
        return val.map_or(RowValues::Null, RowValues::Float);
    }

    if let Ok(val) = row.try_get::<Option<f32>, _>(idx) {
        return val.map_or(RowValues::Null, |f| RowValues::Float(f64::from(f)));
    }

    if let Ok(val) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return val.map_or(RowValues::Null, RowValues::Timestamp);
    }

    // JSON decoding also accepts text columns, so only use it for JSON columns
    if row.column(idx).type_info().name() == "JSON" {
        if let Ok(val) = row.try_get::<Option<JsonValue>, _>(idx) {
            return val.map_or(RowValues::Null, RowValues::JSON);
        }
    }

    if let Ok(val) = row.try_get::<Option<String>, _>(idx) {
        return val.map_or(RowValues::Null, RowValues::Text);
    }

    if let Ok(val) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return val.map_or(RowValues::Null, RowValues::Blob);
    }

    RowValues::Null
}
