use super::runtime;
use common::config::read_config;
use common::error::VmatError;
use materializer::list_views;
use std::path::PathBuf;

/// Print the view definitions in execution order, one per line.
pub fn handle_list(config_path: Option<PathBuf>, profile: Option<&str>) -> Result<(), VmatError> {
    let config = read_config(config_path, profile).map_err(VmatError::config)?;
    let statements = runtime()?
        .block_on(list_views(&config))
        .map_err(VmatError::run)?;
    for statement in &statements {
        println!("{statement}");
    }
    Ok(())
}
