//! # Hostpal Utilities
//!
//! Shared utilities and logging for Hostpal.
//!
//! The platform layer itself only emits `tracing` events; this crate is what
//! binaries use to turn them into output.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_to_file, init_logging_with_level, LogFormat, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
