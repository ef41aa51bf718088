pub mod postgres;
pub mod session;

use crate::postgres::PostgresAdapter;
use async_trait::async_trait;
use common::config::components::connections::{AdapterConnectionDetails, DatabaseAdapterType};
use common::error::diagnostics::DiagnosticMessage;
use std::fmt::Debug;
use thiserror::Error;

pub use session::{Session, SessionOptions};

#[derive(Debug, Error)]
pub enum DatabaseAdapterError {
    #[error("invalid connection details: {context}")]
    InvalidConnectionError { context: DiagnosticMessage },
    #[error("undefined object: {context}")]
    UndefinedObject { context: DiagnosticMessage },
    #[error("unexpected column type: {context}")]
    WrongType { context: DiagnosticMessage },
    #[error("SQL syntax error: {context}")]
    SyntaxError { context: DiagnosticMessage },
    #[error("unexpected database error: {context}")]
    UnexpectedError { context: DiagnosticMessage },
    #[error("I/O error: {context}")]
    IoError {
        context: DiagnosticMessage,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration error: {context}")]
    ConfigError { context: DiagnosticMessage },
    #[error("session closed: {context}")]
    SessionClosed { context: DiagnosticMessage },
}

impl DatabaseAdapterError {
    #[track_caller]
    pub fn invalid_connection(message: impl Into<String>) -> Self {
        Self::InvalidConnectionError {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn undefined_object(message: impl Into<String>) -> Self {
        Self::UndefinedObject {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn wrong_type(message: impl Into<String>) -> Self {
        Self::WrongType {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::SyntaxError {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedError {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn session_closed(message: impl Into<String>) -> Self {
        Self::SessionClosed {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    /// The diagnostic carried by any variant.
    pub fn context(&self) -> &DiagnosticMessage {
        match self {
            Self::InvalidConnectionError { context }
            | Self::UndefinedObject { context }
            | Self::WrongType { context }
            | Self::SyntaxError { context }
            | Self::UnexpectedError { context }
            | Self::IoError { context, .. }
            | Self::ConfigError { context }
            | Self::SessionClosed { context } => context,
        }
    }
}

impl From<std::io::Error> for DatabaseAdapterError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        let message = err.to_string();
        DatabaseAdapterError::IoError {
            context: DiagnosticMessage::new(message),
            source: err,
        }
    }
}

/// One materialised row of a query result.
pub trait SourceRow {
    /// Text value of the column at `idx`; `None` for SQL NULL.
    fn text(&self, idx: usize) -> Result<Option<String>, DatabaseAdapterError>;
}

/// Rows plus the column names the engine reported for the statement.
///
/// Column names are known even when `rows` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<R> {
    pub columns: Vec<String>,
    pub rows: Vec<R>,
}

impl<R> QueryResult<R> {
    /// Position of `name`, preferring an exact match over a case-insensitive one.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }
}

#[async_trait]
pub trait AsyncDatabaseAdapter: Send + Sync {
    type Row: SourceRow + Send + 'static;
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseAdapterError>;
    async fn query(&self, sql: &str) -> Result<QueryResult<Self::Row>, DatabaseAdapterError>;
    /// Release every resource held by the adapter.
    async fn close(&mut self) -> Result<(), DatabaseAdapterError>;
}

#[async_trait]
impl<T> AsyncDatabaseAdapter for Box<T>
where
    T: AsyncDatabaseAdapter + ?Sized,
{
    type Row = T::Row;

    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseAdapterError> {
        (**self).execute(sql).await
    }

    async fn query(&self, sql: &str) -> Result<QueryResult<Self::Row>, DatabaseAdapterError> {
        (**self).query(sql).await
    }

    async fn close(&mut self) -> Result<(), DatabaseAdapterError> {
        (**self).close().await
    }
}

// TODO - needs revisiting when more dbs are supported
pub type AsyncDbAdapter =
    Box<dyn AsyncDatabaseAdapter<Row = tokio_postgres::Row> + Send + Sync + 'static>;

pub async fn create_db_adapter(
    conn_details: &AdapterConnectionDetails,
    options: &SessionOptions,
) -> Result<AsyncDbAdapter, DatabaseAdapterError> {
    match conn_details.adapter_type {
        DatabaseAdapterType::Postgres => {
            let port = conn_details.port.parse::<u16>().map_err(|e| {
                DatabaseAdapterError::config(format!(
                    "port '{}' is not a valid TCP port: {e}",
                    conn_details.port
                ))
            })?;
            Ok(Box::new(
                PostgresAdapter::connect(
                    &conn_details.host,
                    port,
                    &conn_details.database,
                    &conn_details.user,
                    &conn_details.password,
                    options,
                )
                .await?,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup_prefers_exact_match() {
        let result: QueryResult<()> = QueryResult {
            columns: vec!["CreateViewQuery".into(), "createviewquery".into()],
            rows: vec![],
        };
        assert_eq!(result.column_index("createviewquery"), Some(1));
        assert_eq!(result.column_index("CREATEVIEWQUERY"), Some(0));
        assert_eq!(result.column_index("missing"), None);
    }

    #[tokio::test]
    async fn invalid_port_is_a_config_error() {
        let details = AdapterConnectionDetails::new(
            "localhost",
            "postgres",
            "postgres",
            "postgres",
            "not-a-port",
            DatabaseAdapterType::Postgres,
        );
        let options = SessionOptions::new("test");
        let err = create_db_adapter(&details, &options).await.err().unwrap();
        assert!(matches!(err, DatabaseAdapterError::ConfigError { .. }));
    }
}
