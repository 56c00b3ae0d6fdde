//! Carelink Core - shared vocabulary for the carelink crates
//!
//! Defines the error taxonomy, logging bootstrap, and the id/verb types
//! every other layer speaks.

pub mod error;
pub mod logging;
pub mod types;

pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
