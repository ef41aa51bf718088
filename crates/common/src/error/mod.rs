pub mod diagnostics;
pub use crate::config::error::ConfigError;
pub use diagnostics::DiagnosticMessage;

use std::error::Error as StdError;
use thiserror::Error;

/// Top-level failure of a `vmat` command.
#[derive(Debug, Error)]
pub enum VmatError {
    #[error("initialisation failed: {context}")]
    Init {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("configuration failed: {context}")]
    Config {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("run failed: {context}")]
    Run {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl VmatError {
    #[track_caller]
    pub fn init<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let message = err.to_string();
        VmatError::Init {
            context: DiagnosticMessage::new(message),
            source: Some(Box::new(err)),
        }
    }

    #[track_caller]
    pub fn init_msg(message: impl Into<String>) -> Self {
        VmatError::Init {
            context: DiagnosticMessage::new(message.into()),
            source: None,
        }
    }

    #[track_caller]
    pub fn config<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let message = err.to_string();
        VmatError::Config {
            context: DiagnosticMessage::new(message),
            source: Some(Box::new(err)),
        }
    }

    #[track_caller]
    pub fn run<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let message = err.to_string();
        VmatError::Run {
            context: DiagnosticMessage::new(message),
            source: Some(Box::new(err)),
        }
    }
}
