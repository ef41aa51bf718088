use crate::config::components::connections::{parse_connection_profile, ConnectionsConfig};
use crate::config::components::job::{JobConfig, MaterializerConfig};
use crate::config::error::ConfigError;
use serde_yaml::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "view-materializer.yml";

/// Load the job file from `config_dir` (or the working directory) and resolve
/// its connection.
///
/// `profile_override` replaces `connection_profile.profile` from the file.
pub fn read_config(
    config_dir: Option<PathBuf>,
    profile_override: Option<&str>,
) -> Result<MaterializerConfig, ConfigError> {
    let job_file_path = match config_dir {
        Some(dir) => dir.join(CONFIG_FILE_NAME),
        None => PathBuf::from(CONFIG_FILE_NAME),
    };
    if !job_file_path.exists() {
        return Err(ConfigError::incorrect_path(&job_file_path));
    }

    debug!("loading job config from {}", job_file_path.display());
    let job_file = fs::File::open(&job_file_path)?;
    let job: JobConfig = serde_yaml::from_reader(job_file)?;
    job.source.validate()?;

    let config_root = job_file_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let connections_path = resolve_path(&config_root, &job.connection_profile.path);
    if !connections_path.exists() {
        return Err(ConfigError::missing_connection(&connections_path));
    }
    let connections = read_connections(&connections_path)?;

    let profile = profile_override.unwrap_or(&job.connection_profile.profile);
    let connection = connections
        .get(profile)
        .ok_or_else(|| {
            ConfigError::not_found(format!(
                "connection profile '{}' is not defined in {}",
                profile,
                connections_path.display()
            ))
        })?
        .get(&job.target)
        .cloned()
        .ok_or_else(|| {
            ConfigError::not_found(format!(
                "connection '{}' is not defined in profile '{}'",
                job.target, profile
            ))
        })?;

    Ok(MaterializerConfig {
        app_name: job.app_name,
        enable_catalog_support: job.enable_catalog_support,
        source: job.source,
        connection,
    })
}

pub fn read_connections(path: &Path) -> Result<ConnectionsConfig, ConfigError> {
    let conn_file = fs::File::open(path)?;
    let raw_connections: HashMap<String, Value> = serde_yaml::from_reader(conn_file)?;

    let mut connections = ConnectionsConfig::new();
    for (profile, value) in raw_connections.into_iter() {
        let profile_connections = parse_connection_profile(value)
            .map_err(|err| ConfigError::parse_error(format!("profile {}: {}", profile, err)))?;
        connections.insert(profile, profile_connections);
    }
    Ok(connections)
}

fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
