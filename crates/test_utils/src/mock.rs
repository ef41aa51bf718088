//! In-memory stand-in for a SQL engine.
//!
//! Understands exactly two statement shapes: `SELECT * FROM <table>` for
//! reads and `CREATE [OR REPLACE] VIEW <name> AS <query>` for writes.
//! Anything else is rejected as a syntax error, which is enough to exercise
//! the failure paths of the view job.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use shared_clients::{AsyncDatabaseAdapter, DatabaseAdapterError, QueryResult, SourceRow};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

static SELECT_ALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*SELECT\s+\*\s+FROM\s+([A-Za-z_][A-Za-z0-9_$.]*)\s*;?\s*$")
        .expect("select regex is valid")
});

static CREATE_VIEW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)^\s*CREATE\s+(OR\s+REPLACE\s+)?VIEW\s+([A-Za-z_][A-Za-z0-9_$.]*)\s+AS\s+(\S.*?)\s*;?\s*$",
    )
    .expect("create view regex is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub struct MockRow(pub Vec<Option<String>>);

impl SourceRow for MockRow {
    fn text(&self, idx: usize) -> Result<Option<String>, DatabaseAdapterError> {
        self.0
            .get(idx)
            .cloned()
            .ok_or_else(|| DatabaseAdapterError::unexpected(format!("no column at index {idx}")))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockTable {
    pub columns: Vec<String>,
    pub rows: Vec<MockRow>,
}

/// Everything the engine has seen, shared between clones of a [`MockEngine`].
#[derive(Debug, Default)]
pub struct MockState {
    pub tables: HashMap<String, MockTable>,
    /// View name to defining query, lower-cased names.
    pub views: BTreeMap<String, String>,
    /// Every statement handed to `execute`, including failed ones.
    pub attempted: Vec<String>,
    pub queries: Vec<String>,
    pub closes: usize,
    pub fail_close: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> Self {
        let table = MockTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|row| MockRow(row.into_iter().map(|v| v.map(str::to_string)).collect()))
                .collect(),
        };
        self.state.lock().tables.insert(name.to_lowercase(), table);
        self
    }

    /// Table shaped like the exposition tool: an `id` column and one SQL column.
    pub fn with_statements(self, table: &str, column: &str, statements: &[&str]) -> Self {
        let ids: Vec<String> = (1..=statements.len()).map(|i| i.to_string()).collect();
        let rows = ids
            .iter()
            .zip(statements)
            .map(|(id, sql)| vec![Some(id.as_str()), Some(*sql)])
            .collect();
        self.with_table(table, &["id", column], rows)
    }

    pub fn failing_close(self) -> Self {
        self.state.lock().fail_close = true;
        self
    }

    /// Inspect the shared state.
    pub fn state(&self) -> parking_lot::MutexGuard<'_, MockState> {
        self.state.lock()
    }

    pub fn views(&self) -> BTreeMap<String, String> {
        self.state.lock().views.clone()
    }

    pub fn attempted(&self) -> Vec<String> {
        self.state.lock().attempted.clone()
    }

    pub fn closes(&self) -> usize {
        self.state.lock().closes
    }
}

#[async_trait]
impl AsyncDatabaseAdapter for MockEngine {
    type Row = MockRow;

    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseAdapterError> {
        let mut state = self.state.lock();
        state.attempted.push(sql.to_string());

        let caps = CREATE_VIEW
            .captures(sql)
            .ok_or_else(|| DatabaseAdapterError::syntax(format!("cannot parse: {sql}")))?;
        let replace = caps.get(1).is_some();
        let name = caps[2].to_lowercase();
        let body = caps[3].to_string();

        if !replace && state.views.contains_key(&name) {
            return Err(DatabaseAdapterError::unexpected(format!(
                "relation \"{name}\" already exists"
            )));
        }
        if let Some(source) = SELECT_ALL.captures(&body) {
            let table = source[1].to_lowercase();
            if !state.tables.contains_key(&table) && !state.views.contains_key(&table) {
                return Err(DatabaseAdapterError::undefined_object(format!(
                    "relation \"{table}\" does not exist"
                )));
            }
        }
        state.views.insert(name, body);
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryResult<Self::Row>, DatabaseAdapterError> {
        let mut state = self.state.lock();
        state.queries.push(sql.to_string());

        let caps = SELECT_ALL
            .captures(sql)
            .ok_or_else(|| DatabaseAdapterError::syntax(format!("cannot parse: {sql}")))?;
        let name = caps[1].to_lowercase();
        let table = state.tables.get(&name).ok_or_else(|| {
            DatabaseAdapterError::undefined_object(format!("relation \"{name}\" does not exist"))
        })?;

        Ok(QueryResult {
            columns: table.columns.clone(),
            rows: table.rows.clone(),
        })
    }

    async fn close(&mut self) -> Result<(), DatabaseAdapterError> {
        let mut state = self.state.lock();
        state.closes += 1;
        if state.fail_close {
            return Err(DatabaseAdapterError::unexpected("mock engine refused to close"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_and_replaces_views() {
        let mut engine = MockEngine::new();
        engine.execute("CREATE VIEW v1 AS SELECT 1").await.unwrap();
        assert!(engine.execute("CREATE VIEW v1 AS SELECT 2").await.is_err());
        engine
            .execute("create or replace view V1 as SELECT 3;")
            .await
            .unwrap();
        assert_eq!(engine.views()["v1"], "SELECT 3");
        assert_eq!(engine.attempted().len(), 3);
    }

    #[tokio::test]
    async fn malformed_view_is_a_syntax_error() {
        let mut engine = MockEngine::new();
        let err = engine.execute("CREATE VIEW BAD SELECT").await.unwrap_err();
        assert!(matches!(err, DatabaseAdapterError::SyntaxError { .. }));
        assert!(engine.views().is_empty());
    }

    #[tokio::test]
    async fn view_over_missing_table_is_undefined() {
        let mut engine = MockEngine::new();
        let err = engine
            .execute("CREATE VIEW v AS SELECT * FROM nowhere")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseAdapterError::UndefinedObject { .. }));
    }

    #[tokio::test]
    async fn select_all_returns_rows_in_insertion_order() {
        let engine = MockEngine::new().with_statements("t", "ddl", &["a", "b"]);
        let result = engine.query("SELECT * FROM t").await.unwrap();
        assert_eq!(result.columns, vec!["id", "ddl"]);
        assert_eq!(result.rows[1].text(1).unwrap().as_deref(), Some("b"));
        assert!(matches!(
            engine.query("SELECT * FROM missing").await,
            Err(DatabaseAdapterError::UndefinedObject { .. })
        ));
    }
}
