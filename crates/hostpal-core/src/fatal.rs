//! # Fatal Errors
//!
//! The single process-termination path of the platform layer.
//!
//! Some failures cannot be handed back to the caller: a malformed format
//! template means the program itself is wrong, and code elsewhere relies on
//! formatting never failing silently. Those failures end up in [`fatal`],
//! which reports the problem and terminates the process.
//!
//! The default handler logs the report, writes it to stderr and calls
//! [`std::process::abort`]. A different handler can be installed with
//! [`set_fatal_handler`]; tests use this to turn the abort into a panic.
//! Whatever the handler does, [`fatal`] never returns: if the handler
//! returns normally the process is aborted anyway.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hostpal_core::fatal;
//!
//! let answer = 41;
//! if answer != 42 {
//!     fatal!("unexpected answer {answer}");
//! }
//! ```

use std::fmt;
use std::io::Write;
use std::panic::Location;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::error;

/// A fatal error report handed to the installed handler
#[derive(Debug, Clone)]
pub struct FatalReport
{
    /// Diagnostic message
    pub message: String,
    /// Where [`fatal`] was called from
    pub location: &'static Location<'static>,
}

impl fmt::Display for FatalReport
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "fatal error at {}:{}: {}",
            self.location.file(),
            self.location.line(),
            self.message
        )
    }
}

/// Handler invoked by [`fatal`]
pub type FatalHandler = Arc<dyn Fn(&FatalReport) + Send + Sync>;

static HANDLER: RwLock<Option<FatalHandler>> = RwLock::new(None);

/// Install a handler for fatal errors, returning the previous one
///
/// The handler is process-wide. It may panic (the panic unwinds out of
/// [`fatal`]) or exit the process itself; if it returns, the process is
/// aborted.
pub fn set_fatal_handler<F>(handler: F) -> Option<FatalHandler>
where
    F: Fn(&FatalReport) + Send + Sync + 'static,
{
    let mut slot = HANDLER.write().unwrap_or_else(PoisonError::into_inner);
    slot.replace(Arc::new(handler))
}

/// Restore the default handler (report to stderr and abort)
pub fn reset_fatal_handler() -> Option<FatalHandler>
{
    let mut slot = HANDLER.write().unwrap_or_else(PoisonError::into_inner);
    slot.take()
}

/// Report an unrecoverable error and terminate the process
#[track_caller]
pub fn fatal(message: impl Into<String>) -> !
{
    let report = FatalReport {
        message: message.into(),
        location: Location::caller(),
    };

    error!(
        file = report.location.file(),
        line = report.location.line(),
        "{}",
        report.message
    );

    // Clone out of the lock so a panicking handler never runs under it
    let handler = HANDLER.read().unwrap_or_else(PoisonError::into_inner).clone();
    match handler {
        Some(handler) => handler(&report),
        None => default_handler(&report),
    }

    std::process::abort()
}

fn default_handler(report: &FatalReport)
{
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{report}");
    let _ = stderr.flush();
}

/// Format a message and pass it to [`fatal`](crate::fatal::fatal)
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        $crate::fatal::fatal(::std::format!($($arg)*))
    };
}
