//! Web server: task endpoint, browser page and htmx fragments.

mod server;
pub mod templates;

pub use server::{ServerHandle, WebState, build_router, start_server};
