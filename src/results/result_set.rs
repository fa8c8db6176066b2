use std::collections::HashMap;
use std::sync::Arc;

use super::row::{CustomDbRow, index_columns};
use crate::types::RowValues;

/// Rows returned by a query.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    /// The number of rows affected (for DML statements)
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Set the column names shared by all rows added afterwards.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Arc::new(index_columns(&column_names));
        self.column_names = Some(column_names);
    }

    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row using the column names set through [`ResultSet::set_column_names`].
    ///
    /// Ignored when no column names were set.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let Some(column_names) = &self.column_names {
            self.results.push(CustomDbRow::with_index(
                column_names.clone(),
                self.column_index.clone(),
                row_values,
            ));
            self.rows_affected += 1;
        }
    }

    /// First value of the first row, the usual shape of a single-value lookup.
    #[must_use]
    pub fn first_value(&self) -> Option<&RowValues> {
        self.results.first().and_then(|row| row.get_by_index(0))
    }
}
