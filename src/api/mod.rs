//! HTTP surface: a single page plus JSON routes over the analysis workflow.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::build_router;
pub use server::{start_server, ServerHandle, ServerSession};
pub use types::AppState;
