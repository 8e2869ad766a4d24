mod build;
mod check;
mod init;

pub use build::cmd_build;
pub use check::cmd_check;
pub use init::cmd_init;
