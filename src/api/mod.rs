//! API Module
//!
//! The Request Router: maps each HTTP route to one ledger operation,
//! validates and reshapes request bodies, and maps ledger results and
//! errors to HTTP status codes and JSON bodies.

mod error;
mod handlers;
mod server;


pub use error::ApiError;
pub use server::{router, AppState, Server};
