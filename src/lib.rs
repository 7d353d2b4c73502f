//! Declarative CRUD request dispatch.
//!
//! Turns an HTTP request into validated form objects and persisted entities
//! located by route identifiers, then calls the matching controller method.
//!
//! # Data Flow
//! ```text
//! http (axum adapter)
//!     → dispatch::Dispatcher
//!         → routing::RouteTable     (verb + path → RouteSpec)
//!         → forms::bind             (payload → FormInstance, ValidationResult)
//!         → entity::EntityResolver  (token → Entity via persistence)
//!     → handler(HandlerContext, Args) → Reply
//! ```

// Pipeline
pub mod dispatch;
pub mod entity;
pub mod forms;
pub mod routing;
pub mod validation;

// Collaborators
pub mod http;
pub mod persistence;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

// Sample application
pub mod blog;

pub use config::AppConfig;
pub use dispatch::{Controller, Dispatcher, InboundRequest, Param, Reply};
pub use http::HttpServer;
pub use lifecycle::{Application, ApplicationBuilder, Shutdown};
