use crate::config::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

pub const DEFAULT_SOURCE_TABLE: &str = "big_exposition_tool";
pub const DEFAULT_STATEMENT_COLUMN: &str = "createviewquery";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier regex is valid"));

/// Table holding the view definitions and the column carrying the SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceTable {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_column")]
    pub column: String,
}

fn default_table() -> String {
    DEFAULT_SOURCE_TABLE.to_string()
}

fn default_column() -> String {
    DEFAULT_STATEMENT_COLUMN.to_string()
}

impl Default for SourceTable {
    fn default() -> Self {
        Self {
            table: default_table(),
            column: default_column(),
        }
    }
}

impl SourceTable {
    /// Builds a source after checking both names are safe to splice into SQL.
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Result<Self, ConfigError> {
        let source = Self {
            table: table.into(),
            column: column.into(),
        };
        source.validate()?;
        Ok(source)
    }

    /// The table may be schema qualified (`schema.table`); the column may not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let table_ok = !self.table.is_empty()
            && self.table.split('.').all(|part| IDENTIFIER.is_match(part));
        if !table_ok {
            return Err(ConfigError::invalid_identifier("source table", &self.table));
        }
        if !IDENTIFIER.is_match(&self.column) {
            return Err(ConfigError::invalid_identifier("statement column", &self.column));
        }
        Ok(())
    }

    /// Full projection over the source table.
    pub fn select_all(&self) -> String {
        format!("SELECT * FROM {}", self.table)
    }
}
