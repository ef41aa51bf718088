pub mod init;
pub mod list;
pub mod run;

pub use init::{handle_init, InitArgs};
pub use list::handle_list;
pub use run::handle_run;

use common::error::VmatError;
use tokio::runtime::Runtime;

fn runtime() -> Result<Runtime, VmatError> {
    Runtime::new().map_err(VmatError::init)
}
