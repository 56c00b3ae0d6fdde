//! Carelink Web - REST surface
//!
//! Routing, extractors, handlers, and the uniform JSON error envelope
//! over the carelink applications layer.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use config::WebConfig;
pub use error::{WebError, WebResult};
pub use routes::router;
pub use state::AppState;
