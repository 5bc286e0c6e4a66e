//! Tests for bounded formatting

use std::ffi::CString;

use hostpal_core::format::{format_to_vec, vsnprint, FormatArg};
use hostpal_core::snprint;

fn written(buffer: &[u8]) -> &[u8]
{
    let end = buffer.iter().position(|&b| b == 0).expect("buffer is terminated");
    &buffer[..end]
}

#[test]
fn test_snprint_mixed_arguments()
{
    let mut buffer = [0xffu8; 5];
    let len = snprint!(&mut buffer, "%d-%s", 42, "x");
    assert_eq!(len, 4);
    assert_eq!(&buffer, b"42-x\0");
}

#[test]
fn test_snprint_truncates_but_reports_full_length()
{
    let mut buffer = [0xffu8; 3];
    let len = snprint!(&mut buffer, "%d", 12345);
    assert_eq!(len, 5);
    assert_eq!(&buffer, b"12\0");
}

#[test]
fn test_vsnprint_zero_capacity_writes_nothing()
{
    let mut buffer: [u8; 0] = [];
    assert_eq!(vsnprint(&mut buffer, "%s", &[FormatArg::from("abc")]), 3);
}

#[test]
fn test_vsnprint_capacity_one_only_terminates()
{
    let mut buffer = [0xffu8; 1];
    assert_eq!(vsnprint(&mut buffer, "abc", &[]), 3);
    assert_eq!(buffer, [0]);
}

#[test]
fn test_vsnprint_never_writes_past_capacity()
{
    let mut storage = [0xaau8; 8];
    let len = vsnprint(&mut storage[..4], "%s", &[FormatArg::from("overflowing")]);
    assert_eq!(len, 11);
    assert_eq!(&storage[..4], b"ove\0");
    assert_eq!(&storage[4..], &[0xaa; 4]);
}

#[test]
fn test_huge_width_into_tiny_buffer()
{
    // Only the caller's three bytes are written; the padding is counted
    let mut buffer = [0xffu8; 3];
    let len = snprint!(&mut buffer, "%*s", 1_500_000_000, "x");
    assert_eq!(len, 1_500_000_000);
    assert_eq!(&buffer, b"  \0");
}

#[test]
fn test_truncation_across_pieces_matches_native_snprintf()
{
    let mut ours = [0xffu8; 6];
    let len = snprint!(&mut ours, "ab%3dcd%s", 7, "xyz");
    let mut theirs = [0xffu8; 6];
    let template = CString::new("ab%3dcd%s").unwrap();
    let text = CString::new("xyz").unwrap();
    // SAFETY: int and string conversions, 6-byte buffer
    let native = unsafe {
        libc::snprintf(theirs.as_mut_ptr().cast(), theirs.len(), template.as_ptr(), 7 as libc::c_int, text.as_ptr())
    };
    assert_eq!(len, usize::try_from(native).unwrap());
    assert_eq!(ours, theirs);
}

#[test]
fn test_snprint_percent_literal()
{
    let mut buffer = [0u8; 16];
    assert_eq!(snprint!(&mut buffer, "%d%%", 75), 3);
    assert_eq!(written(&buffer), b"75%");
}

#[test]
fn test_snprint_width_and_flags()
{
    let mut buffer = [0u8; 32];
    snprint!(&mut buffer, "[%5d|%-5d|%05d|%+d]", 42, 42, 42, 42);
    assert_eq!(written(&buffer), b"[   42|42   |00042|+42]");
}

#[test]
fn test_snprint_star_width_and_precision()
{
    let mut buffer = [0u8; 32];
    snprint!(&mut buffer, "[%*.*s]", 6, 2, "abcdef");
    assert_eq!(written(&buffer), b"[    ab]");

    snprint!(&mut buffer, "[%*d]", -4, 7);
    assert_eq!(written(&buffer), b"[7   ]");

    // A negative precision is treated as if it were omitted
    snprint!(&mut buffer, "[%.*s]", -1, "abc");
    assert_eq!(written(&buffer), b"[abc]");
}

#[test]
fn test_snprint_unsigned_conversions()
{
    let mut buffer = [0u8; 32];
    snprint!(&mut buffer, "%u %o %x %X %#x", 10u32, 8u32, 255u32, 255u32, 16u32);
    assert_eq!(written(&buffer), b"10 10 ff FF 0x10");
}

#[test]
fn test_snprint_length_modifiers_follow_c()
{
    let mut buffer = [0u8; 64];
    snprint!(&mut buffer, "%hhd %hu %lld %zu", 300, 70000u32, -5_000_000_000i64, 42usize);
    assert_eq!(written(&buffer), b"44 4464 -5000000000 42");
}

#[test]
fn test_snprint_negative_as_unsigned_wraps()
{
    let mut buffer = [0u8; 32];
    snprint!(&mut buffer, "%x", -1);
    assert_eq!(written(&buffer), b"ffffffff");
}

#[test]
fn test_snprint_floats()
{
    let mut buffer = [0u8; 64];
    snprint!(&mut buffer, "%.2f %e %g", 2.5, 1500.0, 0.0001);
    assert_eq!(written(&buffer), b"2.50 1.500000e+03 0.0001");
}

#[test]
fn test_snprint_char_and_strings()
{
    let owned = String::from("owned");
    let c_string = CString::new("cstr").unwrap();
    let mut buffer = [0u8; 64];
    snprint!(&mut buffer, "%c|%s|%s|%s|%.3s", 'Z', &owned, &c_string, b"bytes\0ignored", "truncate");
    assert_eq!(written(&buffer), b"Z|owned|cstr|bytes|tru");
}

#[test]
fn test_snprint_pointer()
{
    let mut buffer = [0u8; 32];
    let null: *const u8 = std::ptr::null();
    let len = snprint!(&mut buffer, "%p", null);
    assert!(len > 0);
    assert_eq!(&buffer[len..=len], b"\0");
}

#[test]
fn test_snprint_template_stops_at_nul()
{
    let mut buffer = [0u8; 16];
    assert_eq!(snprint!(&mut buffer, "ok\0%q"), 2);
    assert_eq!(written(&buffer), b"ok");
}

#[test]
fn test_extra_arguments_are_ignored()
{
    let mut buffer = [0u8; 16];
    assert_eq!(snprint!(&mut buffer, "%d", 1, 2, 3), 1);
    assert_eq!(written(&buffer), b"1");
}

#[test]
fn test_format_to_vec_is_unbounded()
{
    let rendered = format_to_vec("%s-%d", &[FormatArg::from("abc"), FormatArg::from(123)]);
    assert_eq!(rendered, b"abc-123");
}

#[test]
fn test_snprint_matches_native_snprintf()
{
    let cases: [(&str, f64); 4] = [("%10.4f", 3.5), ("%-12e", -0.25), ("%G", 1e-10), ("%a", 1.0)];
    for (template, value) in cases {
        let mut ours = [0u8; 64];
        let len = snprint!(&mut ours, template, value);

        let mut theirs = [0u8; 64];
        let c_template = CString::new(template).unwrap();
        // SAFETY: one double conversion, 64-byte buffer
        let native = unsafe { libc::snprintf(theirs.as_mut_ptr().cast(), theirs.len(), c_template.as_ptr(), value) };

        assert_eq!(len, usize::try_from(native).unwrap(), "{template}");
        assert_eq!(ours, theirs, "{template}");
    }
}
