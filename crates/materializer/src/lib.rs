//! Creates catalog views from SQL definitions stored in a table.
//!
//! The job reads the definition column of the source table once, then runs
//! each definition in scan order through a single [`Session`]. The first
//! failing definition stops the batch; earlier views stay created.
//!
//! [`Session`]: shared_clients::Session

mod error;
mod materialize;
mod pipeline;
mod statements;

pub use error::MaterializerError;
pub use materialize::{execute_all, fetch_statements, run, RunSummary};
pub use pipeline::{list_views, materialize_views, open_session, run_and_close, session_options};
pub use statements::{Statement, StatementList};
