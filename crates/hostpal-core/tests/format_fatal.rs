//! Formatting errors escalate through the fatal hook
//!
//! Every test in this binary installs the same panicking handler, so the
//! process-wide hook never changes under a running test.

use std::sync::Once;

use hostpal_core::fatal::{set_fatal_handler, FatalReport};
use hostpal_core::format::{format_to_vec, FormatArg};
use hostpal_core::snprint;

fn install_panicking_handler()
{
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        set_fatal_handler(|report: &FatalReport| panic!("{}", report.message));
    });
}

#[test]
#[should_panic(expected = "'%q'")]
fn test_unknown_conversion_is_fatal()
{
    install_panicking_handler();
    let mut buffer = [0u8; 16];
    snprint!(&mut buffer, "%q", 1);
}

#[test]
#[should_panic(expected = "format 'value=%d'")]
fn test_missing_argument_is_fatal()
{
    install_panicking_handler();
    let mut buffer = [0u8; 16];
    snprint!(&mut buffer, "value=%d");
}

#[test]
#[should_panic(expected = "expects a string")]
fn test_argument_mismatch_is_fatal()
{
    install_panicking_handler();
    let mut buffer = [0u8; 16];
    snprint!(&mut buffer, "%s", 42);
}

#[test]
#[should_panic(expected = "expects a float")]
fn test_integer_for_float_is_fatal()
{
    install_panicking_handler();
    let _ = format_to_vec("%f", &[FormatArg::Int(1)]);
}

#[test]
#[should_panic(expected = "'%n'")]
fn test_write_back_conversion_is_fatal()
{
    install_panicking_handler();
    let _ = format_to_vec("%n", &[FormatArg::Int(0)]);
}

#[test]
#[should_panic(expected = "incomplete conversion")]
fn test_trailing_percent_is_fatal()
{
    install_panicking_handler();
    let mut buffer = [0u8; 16];
    snprint!(&mut buffer, "100%");
}

#[test]
#[should_panic(expected = "format '%*s%*s'")]
fn test_total_length_past_int_max_is_fatal()
{
    install_panicking_handler();
    // Each conversion fits in a C int, the sum does not
    let mut buffer = [0u8; 3];
    snprint!(&mut buffer, "%*s%*s", 1_100_000_000, "a", 1_100_000_000, "b");
}

#[test]
#[should_panic(expected = "output length exceeds")]
fn test_unbounded_overflow_is_fatal()
{
    install_panicking_handler();
    let _ = format_to_vec("%*s%*s", &[
        FormatArg::Int(1_100_000_000),
        FormatArg::from("a"),
        FormatArg::Int(1_100_000_000),
        FormatArg::from("b"),
    ]);
}

#[test]
fn test_fatal_leaves_buffer_untouched()
{
    install_panicking_handler();
    let mut buffer = [0xeeu8; 8];
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        snprint!(&mut buffer, "%d %d", 1);
    }));
    assert!(result.is_err());
    assert_eq!(buffer, [0xee; 8]);
}
