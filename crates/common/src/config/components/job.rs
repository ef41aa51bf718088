use crate::config::components::connections::{
    AdapterConnectionDetails, Connections, DEFAULT_CONNECTION,
};
use crate::config::components::source::SourceTable;
use serde::Deserialize;

pub const DEFAULT_APP_NAME: &str = "big_exposition_tool_automated_process";

// ---------------- job file ----------------
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_catalog_support")]
    pub enable_catalog_support: bool,
    #[serde(default)]
    pub source: SourceTable,
    pub connection_profile: Connections,
    #[serde(default = "default_target")]
    pub target: String,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_catalog_support() -> bool {
    true
}

fn default_target() -> String {
    DEFAULT_CONNECTION.to_string()
}

// ---------------- resolved config ----------------
/// Everything the job needs once the connection profile has been resolved.
#[derive(Debug, Clone)]
pub struct MaterializerConfig {
    pub app_name: String,
    pub enable_catalog_support: bool,
    pub source: SourceTable,
    pub connection: AdapterConnectionDetails,
}
