//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, fallback handler)
//!     → request.rs (request ID, verb, buffered JSON payload)
//!     → Dispatcher (route match, parameter resolution, handler)
//!     → response.rs (Reply / DispatchError → JSON response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestError, X_REQUEST_ID};
pub use server::HttpServer;
