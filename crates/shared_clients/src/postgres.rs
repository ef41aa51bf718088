use crate::session::SessionOptions;
use crate::{AsyncDatabaseAdapter, DatabaseAdapterError, QueryResult, SourceRow};
use async_trait::async_trait;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, Error, NoTls, Row};
use tracing::{debug, error};

const UNDEFINED_OBJECT_STATES: &[SqlState] = &[
    SqlState::UNDEFINED_TABLE,
    SqlState::UNDEFINED_COLUMN,
    SqlState::INVALID_SCHEMA_NAME,
];

const CONNECTION_STATES: &[SqlState] = &[
    SqlState::CONNECTION_DOES_NOT_EXIST,
    SqlState::CONNECTION_FAILURE,
    SqlState::SQLCLIENT_UNABLE_TO_ESTABLISH_SQLCONNECTION,
    SqlState::INVALID_PASSWORD,
    SqlState::INVALID_AUTHORIZATION_SPECIFICATION,
    SqlState::INVALID_CATALOG_NAME,
];

impl From<Error> for DatabaseAdapterError {
    #[track_caller]
    fn from(err: Error) -> Self {
        let Some(e) = err.as_db_error() else {
            if err.is_closed() {
                return DatabaseAdapterError::invalid_connection(err.to_string());
            }
            return DatabaseAdapterError::unexpected(err.to_string());
        };

        let code = e.code();
        if UNDEFINED_OBJECT_STATES.contains(code) {
            DatabaseAdapterError::undefined_object(e.to_string())
        } else if code == &SqlState::SYNTAX_ERROR {
            DatabaseAdapterError::syntax(e.to_string())
        } else if CONNECTION_STATES.contains(code) {
            DatabaseAdapterError::invalid_connection(e.to_string())
        } else if code == &SqlState::IO_ERROR {
            DatabaseAdapterError::from(std::io::Error::other(e.to_string()))
        } else {
            DatabaseAdapterError::unexpected(e.to_string())
        }
    }
}

impl SourceRow for Row {
    fn text(&self, idx: usize) -> Result<Option<String>, DatabaseAdapterError> {
        self.try_get::<_, Option<String>>(idx).map_err(|e| {
            let column = self
                .columns()
                .get(idx)
                .map(|c| format!("{} ({})", c.name(), c.type_()))
                .unwrap_or_else(|| format!("#{idx}"));
            DatabaseAdapterError::wrong_type(format!("column {column} is not text: {e}"))
        })
    }
}

/// Postgres client plus the background task driving its socket.
pub struct PostgresAdapter {
    client: Option<Client>,
    driver: Option<tokio::task::JoinHandle<()>>,
}

impl PostgresAdapter {
    /// Connect and spawn the connection driver.
    ///
    /// `options.app_name` is reported to the server as `application_name`.
    /// Without catalog support the session's temporary schema is put first
    /// on the `search_path`, so anything created through it is dropped when
    /// the session ends.
    pub async fn connect(
        host: &str,
        port: u16,
        db: &str,
        user: &str,
        password: &str,
        options: &SessionOptions,
    ) -> Result<Self, DatabaseAdapterError> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(host)
            .port(port)
            .dbname(db)
            .user(user)
            .password(password)
            .application_name(&options.app_name);

        debug!(host, port, db, user, "connecting to postgres");
        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| match DatabaseAdapterError::from(e) {
                DatabaseAdapterError::UnexpectedError { context } => {
                    DatabaseAdapterError::InvalidConnectionError { context }
                }
                other => other,
            })?;
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("postgres connection driver exited: {e}");
            }
        });

        let adapter = Self {
            client: Some(client),
            driver: Some(driver),
        };

        if !options.enable_catalog_support {
            adapter
                .client()?
                .batch_execute(
                    "SELECT set_config('search_path', 'pg_temp, ' || current_setting('search_path'), false)",
                )
                .await?;
        }

        Ok(adapter)
    }

    fn client(&self) -> Result<&Client, DatabaseAdapterError> {
        self.client
            .as_ref()
            .ok_or_else(|| DatabaseAdapterError::session_closed("postgres client already released"))
    }
}

#[async_trait]
impl AsyncDatabaseAdapter for PostgresAdapter {
    type Row = Row;

    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseAdapterError> {
        self.client()?.batch_execute(sql).await?;
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryResult<Self::Row>, DatabaseAdapterError> {
        let client = self.client()?;
        let statement = client.prepare(sql).await?;
        let columns = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let rows = client.query(&statement, &[]).await?;
        Ok(QueryResult { columns, rows })
    }

    async fn close(&mut self) -> Result<(), DatabaseAdapterError> {
        // Dropping the client ends the connection; the driver then finishes.
        drop(self.client.take());
        if let Some(driver) = self.driver.take() {
            driver.await.map_err(|e| {
                DatabaseAdapterError::unexpected(format!("connection driver task failed: {e}"))
            })?;
        }
        Ok(())
    }
}
