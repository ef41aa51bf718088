use crate::{
    create_db_adapter, AsyncDatabaseAdapter, AsyncDbAdapter, DatabaseAdapterError, QueryResult,
};
use common::config::components::connections::AdapterConnectionDetails;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Identifies the job to the engine.
    pub app_name: String,
    /// Create objects in the persistent catalog rather than session scope.
    pub enable_catalog_support: bool,
}

impl SessionOptions {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            enable_catalog_support: true,
        }
    }

    pub fn with_catalog_support(mut self, enabled: bool) -> Self {
        self.enable_catalog_support = enabled;
        self
    }
}

/// The single handle through which the job talks to the engine.
///
/// Call [`Session::close`] on every path out of the job. Closing twice is a
/// no-op; using a closed session fails with `SessionClosed`.
pub struct Session<A: AsyncDatabaseAdapter> {
    adapter: A,
    options: SessionOptions,
    closed: bool,
}

impl Session<AsyncDbAdapter> {
    pub async fn open(
        options: SessionOptions,
        conn_details: &AdapterConnectionDetails,
    ) -> Result<Self, DatabaseAdapterError> {
        let adapter = create_db_adapter(conn_details, &options).await?;
        info!(
            "opened session '{}' on {}:{}/{}",
            options.app_name, conn_details.host, conn_details.port, conn_details.database
        );
        Ok(Self::from_adapter(adapter, options))
    }
}

impl<A: AsyncDatabaseAdapter> Session<A> {
    pub fn from_adapter(adapter: A, options: SessionOptions) -> Self {
        Self {
            adapter,
            options,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub async fn query(&self, sql: &str) -> Result<QueryResult<A::Row>, DatabaseAdapterError> {
        self.ensure_open()?;
        self.adapter.query(sql).await
    }

    pub async fn execute(&mut self, sql: &str) -> Result<(), DatabaseAdapterError> {
        self.ensure_open()?;
        self.adapter.execute(sql).await
    }

    pub async fn close(&mut self) -> Result<(), DatabaseAdapterError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.adapter.close().await?;
        info!("closed session '{}'", self.options.app_name);
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), DatabaseAdapterError> {
        if self.closed {
            return Err(DatabaseAdapterError::session_closed(format!(
                "session '{}' has already been closed",
                self.options.app_name
            )));
        }
        Ok(())
    }
}

impl<A: AsyncDatabaseAdapter> Drop for Session<A> {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                "session '{}' dropped without close; releasing it implicitly",
                self.options.app_name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceRow;
    use async_trait::async_trait;

    struct NoRow;

    impl SourceRow for NoRow {
        fn text(&self, _idx: usize) -> Result<Option<String>, DatabaseAdapterError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct CountingAdapter {
        executed: Vec<String>,
        closes: usize,
    }

    #[async_trait]
    impl AsyncDatabaseAdapter for CountingAdapter {
        type Row = NoRow;

        async fn execute(&mut self, sql: &str) -> Result<(), DatabaseAdapterError> {
            self.executed.push(sql.to_string());
            Ok(())
        }

        async fn query(&self, _sql: &str) -> Result<QueryResult<NoRow>, DatabaseAdapterError> {
            Ok(QueryResult {
                columns: vec![],
                rows: vec![],
            })
        }

        async fn close(&mut self) -> Result<(), DatabaseAdapterError> {
            self.closes += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn close_releases_adapter_once() {
        let mut session =
            Session::from_adapter(CountingAdapter::default(), SessionOptions::new("job"));
        session.execute("SELECT 1").await.unwrap();
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert!(session.is_closed());
        assert_eq!(session.adapter.closes, 1);
        assert_eq!(session.adapter.executed, vec!["SELECT 1"]);
    }

    #[tokio::test]
    async fn closed_session_rejects_work() {
        let mut session =
            Session::from_adapter(CountingAdapter::default(), SessionOptions::new("job"));
        session.close().await.unwrap();
        assert!(matches!(
            session.execute("SELECT 1").await,
            Err(DatabaseAdapterError::SessionClosed { .. })
        ));
        assert!(matches!(
            session.query("SELECT 1").await,
            Err(DatabaseAdapterError::SessionClosed { .. })
        ));
        assert!(session.adapter.executed.is_empty());
    }

    #[test]
    fn options_default_to_catalog_support() {
        let options = SessionOptions::new("job");
        assert!(options.enable_catalog_support);
        assert!(!options.with_catalog_support(false).enable_catalog_support);
    }
}
