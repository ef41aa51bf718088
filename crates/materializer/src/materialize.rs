use crate::error::MaterializerError;
use crate::statements::StatementList;
use common::config::components::source::SourceTable;
use logging::timeit;
use shared_clients::{AsyncDatabaseAdapter, Session, SourceRow};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub fetched: usize,
    pub executed: usize,
}

/// Read every view definition from `source`, in scan order.
///
/// The source is scanned once with a full projection. A missing table or
/// column, or a NULL / blank definition, fails before anything executes.
pub async fn fetch_statements<A>(
    session: &Session<A>,
    source: &SourceTable,
) -> Result<StatementList, MaterializerError>
where
    A: AsyncDatabaseAdapter,
{
    source.validate()?;
    let sql = source.select_all();
    debug!("{sql}");

    let result = timeit!(format!("Fetched view definitions from {}", source.table), {
        session
            .query(&sql)
            .await
            .map_err(MaterializerError::from_fetch)?
    });

    let column = result.column_index(&source.column).ok_or_else(|| {
        MaterializerError::schema(format!(
            "column '{}' not found in {} (columns: {})",
            source.column,
            source.table,
            result.columns.join(", ")
        ))
    })?;

    let mut texts = Vec::with_capacity(result.rows.len());
    for (index, row) in result.rows.iter().enumerate() {
        let text = row.text(column).map_err(MaterializerError::from_fetch)?;
        match text {
            Some(text) if !text.trim().is_empty() => texts.push(text),
            Some(_) => {
                return Err(MaterializerError::schema(format!(
                    "row {index} of {} has a blank '{}'",
                    source.table, source.column
                )))
            }
            None => {
                return Err(MaterializerError::schema(format!(
                    "row {index} of {} has a NULL '{}'",
                    source.table, source.column
                )))
            }
        }
    }

    let statements: StatementList = texts.into_iter().collect();
    info!(
        "found {} view definition(s) in {}",
        statements.len(),
        source.table
    );
    Ok(statements)
}

/// Execute `statements` one at a time, in order.
///
/// There is no surrounding transaction: the first failure stops the batch,
/// statements before it stay applied and statements after it are never sent.
pub async fn execute_all<A>(
    session: &mut Session<A>,
    statements: &StatementList,
) -> Result<usize, MaterializerError>
where
    A: AsyncDatabaseAdapter,
{
    let total = statements.len();
    timeit!(format!("Executed {total} view definition(s)"), {
        for statement in statements {
            info!("executing statement {}/{}", statement.index + 1, total);
            debug!("{}", statement.sql);
            if let Err(e) = session.execute(&statement.sql).await {
                error!("statement {} failed: {e}", statement.index);
                return Err(MaterializerError::from_statement(
                    statement.index,
                    &statement.sql,
                    e,
                ));
            }
        }
    });
    Ok(total)
}

/// Fetch then execute, on an already open session.
pub async fn run<A>(
    session: &mut Session<A>,
    source: &SourceTable,
) -> Result<RunSummary, MaterializerError>
where
    A: AsyncDatabaseAdapter,
{
    let statements = fetch_statements(session, source).await?;
    let executed = execute_all(session, &statements).await?;
    Ok(RunSummary {
        fetched: statements.len(),
        executed,
    })
}
