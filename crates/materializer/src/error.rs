use common::error::{ConfigError, DiagnosticMessage};
use shared_clients::DatabaseAdapterError;
use std::error::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaterializerError {
    #[error("engine unavailable: {context}")]
    EngineUnavailable {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
    #[error("schema error: {context}")]
    SchemaError {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
    /// `index` is the zero-based position of the statement in the batch.
    #[error("statement {index} failed: {context}")]
    StatementExecutionError {
        index: usize,
        sql: String,
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
    #[error("configuration error: {context}")]
    ConfigError {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
    #[error("session closed: {context}")]
    SessionClosed { context: DiagnosticMessage },
}

impl MaterializerError {
    /// Failure to reach or authenticate against the engine.
    pub fn engine_unavailable(err: DatabaseAdapterError) -> Self {
        match err {
            DatabaseAdapterError::ConfigError { context } => Self::ConfigError {
                context,
                source: None,
            },
            other => Self::EngineUnavailable {
                context: other.context().clone(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Failure while reading the source table.
    pub fn from_fetch(err: DatabaseAdapterError) -> Self {
        match err {
            DatabaseAdapterError::SessionClosed { context } => Self::SessionClosed { context },
            DatabaseAdapterError::InvalidConnectionError { .. }
            | DatabaseAdapterError::IoError { .. } => Self::engine_unavailable(err),
            other => Self::SchemaError {
                context: other.context().clone(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Failure of statement `index` in the batch.
    pub fn from_statement(index: usize, sql: &str, err: DatabaseAdapterError) -> Self {
        match err {
            DatabaseAdapterError::SessionClosed { context } => Self::SessionClosed { context },
            other => Self::StatementExecutionError {
                index,
                sql: sql.to_string(),
                context: other.context().clone(),
                source: Some(Box::new(other)),
            },
        }
    }

    #[track_caller]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaError {
            context: DiagnosticMessage::new(message.into()),
            source: None,
        }
    }

    /// Position of the failing statement, for execution failures.
    pub fn statement_index(&self) -> Option<usize> {
        match self {
            Self::StatementExecutionError { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl From<ConfigError> for MaterializerError {
    #[track_caller]
    fn from(err: ConfigError) -> Self {
        let message = err.to_string();
        Self::ConfigError {
            context: DiagnosticMessage::new(message),
            source: Some(Box::new(err)),
        }
    }
}
