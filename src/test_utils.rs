//! An in-memory executor for exercising the helpers without a MySQL server.
//!
//! [`ScriptedExecutor`] records every statement it receives, answers selects from a queue of
//! prepared result sets, and fails statements containing a configured fragment with a server
//! error.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DbError, DriverError, SqlMiddlewareDbError};
use crate::executor::AsyncDatabaseExecutor;
use crate::results::ResultSet;
use crate::types::RowValues;

/// A statement received by a [`ScriptedExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub query: String,
    pub params: Vec<RowValues>,
}

#[derive(Debug)]
struct Failure {
    fragment: String,
    number: u16,
    message: String,
}

#[derive(Debug, Default)]
struct Script {
    selects: VecDeque<ResultSet>,
    failures: Vec<Failure>,
    statements: Vec<RecordedStatement>,
    select_delay: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    script: Mutex<Script>,
}

impl ScriptedExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the result of the next select. Selects beyond the queue return no rows.
    pub fn push_rows(&self, columns: &[&str], rows: Vec<Vec<RowValues>>) -> &Self {
        let mut rs = ResultSet::with_capacity(rows.len());
        rs.set_column_names(Arc::new(columns.iter().map(|c| (*c).to_string()).collect()));
        for row in rows {
            rs.add_row_values(row);
        }
        self.script().selects.push_back(rs);
        self
    }

    /// Queue a single-value result for the next select.
    pub fn push_value(&self, column: &str, value: RowValues) -> &Self {
        self.push_rows(&[column], vec![vec![value]])
    }

    /// Queue an empty result for the next select.
    pub fn push_empty(&self) -> &Self {
        self.push_rows(&[], Vec::new())
    }

    /// Fail every statement containing `fragment` with server error `number`.
    pub fn fail_when(&self, fragment: &str, number: u16, message: &str) -> &Self {
        self.script().failures.push(Failure {
            fragment: fragment.to_string(),
            number,
            message: message.to_string(),
        });
        self
    }

    /// Sleep for `delay` before answering each select.
    pub fn delay_selects(&self, delay: Duration) -> &Self {
        self.script().select_delay = Some(delay);
        self
    }

    #[must_use]
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.script().statements.clone()
    }

    /// Query text of every statement received, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.script()
            .statements
            .iter()
            .map(|s| s.query.clone())
            .collect()
    }

    fn record(&self, query: &str, params: &[RowValues]) -> Result<(), SqlMiddlewareDbError> {
        let mut script = self.script();
        script.statements.push(RecordedStatement {
            query: query.to_string(),
            params: params.to_vec(),
        });

        match script.failures.iter().find(|f| query.contains(&f.fragment)) {
            Some(failure) => Err(DbError::new(DriverError::Server {
                number: failure.number,
                sql_state: Some("HY000".to_string()),
                message: failure.message.clone(),
            })
            .into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AsyncDatabaseExecutor for ScriptedExecutor {
    async fn execute_batch(&self, query: &str) -> Result<(), SqlMiddlewareDbError> {
        self.record(query, &[])
    }

    async fn execute_select(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlMiddlewareDbError> {
        self.record(query, params)?;
        let delay = self.script().select_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.script().selects.pop_front().unwrap_or_default())
    }

    async fn execute_dml(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<u64, SqlMiddlewareDbError> {
        self.record(query, params)?;
        Ok(0)
    }
}
