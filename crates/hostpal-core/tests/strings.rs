//! Tests for bounded string utilities

use hostpal_core::strings::{strndup, strnlen};

#[test]
fn test_strnlen_stops_at_terminator()
{
    assert_eq!(strnlen(b"hello\0world", 64), 5);
}

#[test]
fn test_strnlen_respects_bound()
{
    assert_eq!(strnlen(b"hello world", 5), 5);
    assert_eq!(strnlen(b"hello\0", 3), 3);
}

#[test]
fn test_strnlen_unterminated_slice()
{
    // The end of the slice acts as a terminator
    assert_eq!(strnlen(b"abc", 100), 3);
}

#[test]
fn test_strnlen_never_exceeds_bound()
{
    let source = b"the quick brown fox\0jumps";
    for n in 0..=source.len() + 4 {
        let len = strnlen(source, n);
        assert!(len <= n);
        assert_eq!(len, n.min(19));
    }
}

#[test]
fn test_strndup_copies_prefix()
{
    let source = b"runtime platform";
    let copy = strndup(source, 7).unwrap();

    assert_eq!(copy.as_bytes(), b"runtime");
    assert_eq!(copy.as_bytes_with_nul(), b"runtime\0");
}

#[test]
fn test_strndup_stops_at_terminator()
{
    let copy = strndup(b"abc\0def", 10).unwrap();
    assert_eq!(copy.as_bytes(), b"abc");
}

#[test]
fn test_strndup_length_matches_strnlen()
{
    let source = b"fuchsia\0component";
    for n in [0, 1, 4, 7, 8, 100] {
        let copy = strndup(source, n).unwrap();
        assert_eq!(copy.as_bytes().len(), strnlen(source, n));
        assert_eq!(copy.as_bytes(), &source[..strnlen(source, n)]);
    }
}

#[test]
fn test_strndup_is_independent_copy()
{
    let source = b"owned".to_vec();
    let copy = strndup(&source, source.len()).unwrap();

    assert_ne!(copy.as_ptr().cast::<u8>(), source.as_ptr());
    drop(source);
    assert_eq!(copy.to_str().unwrap(), "owned");
}

#[test]
fn test_strndup_empty()
{
    let copy = strndup(b"", 16).unwrap();
    assert!(copy.as_bytes().is_empty());
    assert_eq!(copy.as_bytes_with_nul(), b"\0");
}
