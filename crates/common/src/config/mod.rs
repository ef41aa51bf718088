pub mod components;
pub mod error;
pub mod loader;

pub use loader::{read_config, CONFIG_FILE_NAME};
