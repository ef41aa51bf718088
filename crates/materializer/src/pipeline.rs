use crate::error::MaterializerError;
use crate::materialize::{fetch_statements, run, RunSummary};
use crate::statements::StatementList;
use common::config::components::job::MaterializerConfig;
use common::config::components::source::SourceTable;
use shared_clients::{AsyncDatabaseAdapter, AsyncDbAdapter, Session, SessionOptions};
use tracing::warn;

pub fn session_options(config: &MaterializerConfig) -> SessionOptions {
    SessionOptions::new(config.app_name.clone())
        .with_catalog_support(config.enable_catalog_support)
}

pub async fn open_session(
    config: &MaterializerConfig,
) -> Result<Session<AsyncDbAdapter>, MaterializerError> {
    Session::open(session_options(config), &config.connection)
        .await
        .map_err(MaterializerError::engine_unavailable)
}

/// Open a session, create every view, close the session.
pub async fn materialize_views(
    config: &MaterializerConfig,
) -> Result<RunSummary, MaterializerError> {
    let session = open_session(config).await?;
    run_and_close(session, &config.source).await
}

/// Open a session, read the view definitions without executing them, close.
pub async fn list_views(config: &MaterializerConfig) -> Result<StatementList, MaterializerError> {
    let mut session = open_session(config).await?;
    let fetched = fetch_statements(&session, &config.source).await;
    finish(&mut session, fetched).await
}

/// Run the job on `session` and close it whatever the outcome.
///
/// A failed run is reported in preference to a failed close.
pub async fn run_and_close<A>(
    mut session: Session<A>,
    source: &SourceTable,
) -> Result<RunSummary, MaterializerError>
where
    A: AsyncDatabaseAdapter,
{
    let outcome = run(&mut session, source).await;
    finish(&mut session, outcome).await
}

async fn finish<A, T>(
    session: &mut Session<A>,
    outcome: Result<T, MaterializerError>,
) -> Result<T, MaterializerError>
where
    A: AsyncDatabaseAdapter,
{
    let closed = session.close().await;
    match (outcome, closed) {
        (Err(e), Err(close_err)) => {
            warn!("failed to close session after error: {close_err}");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(_), Err(close_err)) => Err(MaterializerError::engine_unavailable(close_err)),
        (Ok(value), Ok(())) => Ok(value),
    }
}
