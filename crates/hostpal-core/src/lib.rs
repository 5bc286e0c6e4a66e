//! # hostpal-core
//!
//! Platform primitives for a managed runtime, kept behind one small API so
//! the rest of the runtime never sees a platform conditional.
//!
//! This crate provides:
//! - Bounded string length and duplication ([`strings`])
//! - Bounded printf-style rendering into caller buffers ([`format`])
//! - A lazily acquired, process-wide service directory handle ([`service_context`])
//! - The process-termination path for unrecoverable errors ([`fatal`])
//!
//! ## Platform Support
//!
//! - **Fuchsia**: everything, including the process-wide `service_context()`
//! - **Other unix**: everything except the process-wide accessor; a
//!   [`service_context::ServiceContextProvider`] can still be built explicitly
//!
//! ## Why unsafe code is needed
//!
//! Length scanning and formatting call into the C library (`strnlen`,
//! `snprintf`) so results match the host byte for byte. Those calls are
//! wrapped in safe functions that own the bounds.

#![allow(unsafe_code)] // Required for libc calls (strnlen, snprintf)

#[cfg(not(unix))]
compile_error!("hostpal-core supports unix-family targets only");

pub mod error;
pub mod fatal;
pub mod format;
pub mod prelude;
pub mod service_context;
pub mod strings;

pub use error::{PlatformError, PlatformResult};
pub use format::{format_to_vec, vsnprint, FormatArg};
#[cfg(target_os = "fuchsia")]
pub use service_context::{service_context, try_service_context};
pub use strings::{strndup, strnlen};
