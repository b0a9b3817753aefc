//! CLI command implementations.

mod build;
mod dev;
mod init;
mod routes;

pub use build::build_site;
pub use dev::{dev_server, DevOptions};
pub use init::init_project;
pub use routes::print_routes;
