//! # Error Types
//!
//! Recoverable errors for platform operations.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Formatting errors are deliberately absent from this enum: a malformed
//! template is a programming defect and goes through [`crate::fatal`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for platform operations
///
/// ## Error Categories
///
/// 1. **Allocation errors**: AllocationFailure
/// 2. **Service directory errors**: ServiceDirectory, InvalidProtocolName
/// 3. **I/O errors**: Io
#[derive(Error, Debug)]
pub enum PlatformError
{
    /// The allocator refused to provide a buffer of the requested size
    ///
    /// Returned by [`crate::strings::strndup`] and other fallible reservations
    /// when they fail. For `strndup` the size includes the trailing NUL byte.
    #[error("Allocation failure: could not reserve {requested} bytes")]
    AllocationFailure
    {
        /// Number of bytes that were requested
        requested: usize,
    },

    /// The service directory could not be opened from the process namespace
    ///
    /// This happens when:
    /// - The component was started without a `/svc` namespace entry
    /// - The configured path does not exist or is not a directory
    /// - The process lacks the rights to open it
    #[error("Failed to open service directory {}: {source}", path.display())]
    ServiceDirectory
    {
        /// Path that was opened
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A protocol name was empty or tried to escape the service directory
    #[error("Invalid protocol name: {0:?}")]
    InvalidProtocolName(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, PlatformError>`
///
/// ```rust
/// use hostpal_core::error::PlatformResult;
/// fn foo() -> PlatformResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;
