//! Command implementations for the lfa CLI.

mod batch;
mod classify;
mod crop;
mod init;
mod labels;
mod train;

pub use batch::cmd_batch;
pub use classify::cmd_classify;
pub use crop::cmd_crop;
pub use init::cmd_init;
pub use labels::cmd_labels;
pub use train::cmd_train;
