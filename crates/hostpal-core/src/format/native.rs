//! # Native Formatter
//!
//! Renders one conversion at a time through the C library's `snprintf`, so
//! the bytes produced match the host platform exactly.

use std::ffi::{CStr, CString};
use std::ptr;

use libc::{c_char, c_double, c_int, c_long, c_longlong, c_uint, c_ulong, c_ulonglong, c_void};

/// A value already converted to the C type its conversion expects
#[derive(Debug)]
pub(super) enum NativeValue
{
    Int(c_int),
    UInt(c_uint),
    Long(c_long),
    ULong(c_ulong),
    LongLong(c_longlong),
    ULongLong(c_ulonglong),
    IntMax(libc::intmax_t),
    UIntMax(libc::uintmax_t),
    Size(libc::size_t),
    SSize(libc::ssize_t),
    PtrDiff(libc::ptrdiff_t),
    Double(c_double),
    Ptr(*const c_void),
    Str(CString),
}

/// Render `value` with `directive` into `dst`, truncating like `snprintf`
///
/// At most `dst.len() - 1` bytes are written, followed by a terminator. An
/// empty `dst` is only measured. Returns the untruncated length, or the
/// negative `snprintf` result.
pub(super) fn render_into(directive: &CStr, value: &NativeValue, dst: &mut [u8]) -> Result<usize, c_int>
{
    let buffer = if dst.is_empty() {
        ptr::null_mut()
    } else {
        dst.as_mut_ptr().cast::<c_char>()
    };
    let produced = call(buffer, dst.len(), directive, value);
    usize::try_from(produced).map_err(|_| produced)
}

fn call(buffer: *mut c_char, size: usize, directive: &CStr, value: &NativeValue) -> c_int
{
    let format = directive.as_ptr();
    // SAFETY: `format` contains exactly one conversion whose C type matches the
    // variant passed, and `buffer` is either null with `size == 0` or points to
    // at least `size` writable bytes.
    unsafe {
        match value {
            NativeValue::Int(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::UInt(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::Long(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::ULong(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::LongLong(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::ULongLong(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::IntMax(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::UIntMax(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::Size(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::SSize(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::PtrDiff(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::Double(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::Ptr(v) => libc::snprintf(buffer, size, format, *v),
            NativeValue::Str(v) => libc::snprintf(buffer, size, format, v.as_ptr()),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn directive(text: &str) -> CString
    {
        CString::new(text).unwrap()
    }

    #[test]
    fn test_render_into_fits()
    {
        let mut dst = [0xffu8; 8];
        assert_eq!(render_into(&directive("%05d"), &NativeValue::Int(42), &mut dst), Ok(5));
        assert_eq!(&dst[..6], b"00042\0");
        assert_eq!(dst[6], 0xff);
    }

    #[test]
    fn test_render_into_truncates()
    {
        let mut dst = [0xffu8; 3];
        assert_eq!(render_into(&directive("%05d"), &NativeValue::Int(42), &mut dst), Ok(5));
        assert_eq!(&dst, b"00\0");
    }

    #[test]
    fn test_render_into_empty_only_measures()
    {
        let value = NativeValue::Str(CString::new("platform").unwrap());
        assert_eq!(render_into(&directive("%.4s"), &value, &mut []), Ok(4));
    }

    #[test]
    fn test_render_into_double()
    {
        let mut dst = [0u8; 8];
        assert_eq!(render_into(&directive("%.2f"), &NativeValue::Double(1.23456), &mut dst), Ok(4));
        assert_eq!(&dst[..5], b"1.23\0");
    }
}
