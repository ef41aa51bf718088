use super::runtime;
use common::config::read_config;
use common::error::VmatError;
use materializer::materialize_views;
use std::path::PathBuf;
use tracing::info;

/// Create every view listed in the configured source table.
pub fn handle_run(config_path: Option<PathBuf>, profile: Option<&str>) -> Result<(), VmatError> {
    let config = read_config(config_path, profile).map_err(VmatError::config)?;
    let summary = runtime()?
        .block_on(materialize_views(&config))
        .map_err(VmatError::run)?;
    info!(
        "created {} view(s) from {}",
        summary.executed, config.source.table
    );
    Ok(())
}
