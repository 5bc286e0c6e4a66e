//! # Bounded String Utilities
//!
//! `strnlen` and `strndup` over byte buffers that are not guaranteed to be
//! NUL-terminated.
//!
//! A source is a `&[u8]`; the end of the slice counts as a terminator, so
//! neither function can read past the buffer it was given, and neither reads
//! past offset `n`.

use std::ffi::CString;

use tracing::trace;

use crate::error::{PlatformError, PlatformResult};

/// Length of `source` up to the first NUL, never more than `n`
///
/// Equivalent to `min(strlen(source), n)` where the end of the slice acts
/// as a terminator.
///
/// ## Example
///
/// ```rust
/// use hostpal_core::strings::strnlen;
///
/// assert_eq!(strnlen(b"hello\0world", 64), 5);
/// assert_eq!(strnlen(b"hello", 3), 3);
/// ```
#[must_use]
pub fn strnlen(source: &[u8], n: usize) -> usize
{
    let bound = n.min(source.len());
    scan(&source[..bound])
}

fn scan(bytes: &[u8]) -> usize
{
    // SAFETY: `bytes` is a live slice and strnlen reads at most `bytes.len()` bytes.
    unsafe { libc::strnlen(bytes.as_ptr().cast::<libc::c_char>(), bytes.len()) }
}

/// Newly allocated, NUL-terminated copy of at most `n` bytes of `source`
///
/// Copying stops at the first NUL or after `n` bytes, whichever comes first.
/// The result owns its buffer.
///
/// ## Errors
///
/// Returns [`PlatformError::AllocationFailure`] if the allocator cannot
/// provide the buffer.
///
/// ## Example
///
/// ```rust
/// use hostpal_core::strings::strndup;
///
/// let copy = strndup(b"runtime", 3)?;
/// assert_eq!(copy.as_bytes(), b"run");
/// # Ok::<(), hostpal_core::error::PlatformError>(())
/// ```
pub fn strndup(source: &[u8], n: usize) -> PlatformResult<CString>
{
    let len = strnlen(source, n);
    let requested = len.saturating_add(1);

    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(requested)
        .map_err(|_| PlatformError::AllocationFailure { requested })?;
    buffer.extend_from_slice(&source[..len]);
    buffer.push(0);

    trace!(len, bound = n, "duplicated bounded string");

    // SAFETY: `strnlen` stopped before the first NUL, so the only NUL is the one just pushed.
    Ok(unsafe { CString::from_vec_with_nul_unchecked(buffer) })
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_scan_stops_at_nul()
    {
        assert_eq!(scan(b"ab\0cd"), 2);
        assert_eq!(scan(b"abcd"), 4);
        assert_eq!(scan(b""), 0);
    }

    #[test]
    fn test_strnlen_zero_bound()
    {
        assert_eq!(strnlen(b"abc", 0), 0);
    }
}
