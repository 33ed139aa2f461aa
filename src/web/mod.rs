//! Local web panel: the page UI and the JSON API behind it

mod handlers;
pub mod server;
mod static_files;
mod types;

pub use server::start_server;
pub use types::ApiResponse;
