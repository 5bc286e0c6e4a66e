//! # Bounded Formatting
//!
//! `snprintf`-style rendering into a caller-supplied buffer.
//!
//! Arguments are passed as typed [`FormatArg`] values and checked against the
//! template before anything reaches the C library. Each conversion is then
//! rendered by the platform's native `snprintf`, so output bytes, truncation
//! and the "would have written" length match the host C library.
//!
//! ## Error policy
//!
//! Formatting never fails from the caller's point of view. A malformed
//! template, an argument mismatch or a negative result from the native
//! formatter is a programming defect and terminates the process through
//! [`crate::fatal`], naming the template in the diagnostic.
//!
//! ## Example
//!
//! ```rust
//! use hostpal_core::snprint;
//!
//! let mut buffer = [0u8; 16];
//! let written = snprint!(&mut buffer, "%d-%s", 42, "x");
//! assert_eq!(written, 4);
//! assert_eq!(&buffer[..5], b"42-x\0");
//! ```

mod native;
mod template;

use std::ffi::{CStr, CString};

use libc::c_void;
use tracing::trace;

use self::native::NativeValue;
pub use self::template::{parse, Conversion, ConversionKind, Count, FormatError, Length, Piece};

/// A typed argument for a template conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatArg<'a>
{
    /// Signed integer (`%d`, `%i`, or `*` width/precision)
    Int(i64),
    /// Unsigned integer (`%u`, `%o`, `%x`, `%X`)
    UInt(u64),
    /// Floating point (`%f`, `%e`, `%g`, `%a` and uppercase forms)
    Float(f64),
    /// Character (`%c`)
    Char(char),
    /// Byte string, read up to its first NUL (`%s`)
    Str(&'a [u8]),
    /// Pointer (`%p`)
    Ptr(*const c_void),
}

impl FormatArg<'_>
{
    fn type_name(&self) -> &'static str
    {
        match self {
            FormatArg::Int(_) | FormatArg::UInt(_) => "an integer",
            FormatArg::Float(_) => "a float",
            FormatArg::Char(_) => "a character",
            FormatArg::Str(_) => "a string",
            FormatArg::Ptr(_) => "a pointer",
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn as_i64(&self) -> Option<i64>
    {
        match *self {
            FormatArg::Int(v) => Some(v),
            FormatArg::UInt(v) => Some(v as i64),
            _ => None,
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn as_u64(&self) -> Option<u64>
    {
        match *self {
            FormatArg::Int(v) => Some(v as u64),
            FormatArg::UInt(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $wide:ty: $($t:ty),*) => {
        $(
            #[allow(clippy::cast_possible_wrap, clippy::unnecessary_cast)]
            impl From<$t> for FormatArg<'_>
            {
                fn from(value: $t) -> Self
                {
                    FormatArg::$variant(value as $wide)
                }
            }
        )*
    };
}

impl_from_int!(Int, i64: i8, i16, i32, i64, isize);
impl_from_int!(UInt, u64: u8, u16, u32, u64, usize);

impl From<f32> for FormatArg<'_>
{
    fn from(value: f32) -> Self
    {
        FormatArg::Float(f64::from(value))
    }
}

impl From<f64> for FormatArg<'_>
{
    fn from(value: f64) -> Self
    {
        FormatArg::Float(value)
    }
}

impl From<char> for FormatArg<'_>
{
    fn from(value: char) -> Self
    {
        FormatArg::Char(value)
    }
}

impl<'a> From<&'a str> for FormatArg<'a>
{
    fn from(value: &'a str) -> Self
    {
        FormatArg::Str(value.as_bytes())
    }
}

impl<'a> From<&'a String> for FormatArg<'a>
{
    fn from(value: &'a String) -> Self
    {
        FormatArg::Str(value.as_bytes())
    }
}

impl<'a> From<&'a CStr> for FormatArg<'a>
{
    fn from(value: &'a CStr) -> Self
    {
        FormatArg::Str(value.to_bytes())
    }
}

impl<'a> From<&'a CString> for FormatArg<'a>
{
    fn from(value: &'a CString) -> Self
    {
        FormatArg::Str(value.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for FormatArg<'a>
{
    fn from(value: &'a [u8]) -> Self
    {
        FormatArg::Str(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for FormatArg<'a>
{
    fn from(value: &'a [u8; N]) -> Self
    {
        FormatArg::Str(value)
    }
}

impl<T> From<*const T> for FormatArg<'_>
{
    fn from(value: *const T) -> Self
    {
        FormatArg::Ptr(value.cast())
    }
}

impl<T> From<*mut T> for FormatArg<'_>
{
    fn from(value: *mut T) -> Self
    {
        FormatArg::Ptr(value.cast_const().cast())
    }
}

/// Render `template` into `buffer`, truncating to fit
///
/// Writes at most `buffer.len() - 1` bytes followed by a NUL. An empty
/// buffer is left untouched. Returns the length the full rendering has,
/// which is larger than what was written when the output was truncated.
///
/// Terminates the process on any formatting error; see the module docs.
///
/// ## Example
///
/// ```rust
/// use hostpal_core::format::{vsnprint, FormatArg};
///
/// let mut buffer = [0u8; 3];
/// let needed = vsnprint(&mut buffer, "%d", &[FormatArg::Int(12345)]);
/// assert_eq!(needed, 5);
/// assert_eq!(&buffer, b"12\0");
/// ```
pub fn vsnprint(buffer: &mut [u8], template: &str, args: &[FormatArg<'_>]) -> usize
{
    let needed = match prepare(template, args).and_then(|segments| write_segments(&segments, &mut *buffer)) {
        Ok(needed) => needed,
        Err(err) => fail(template, &err),
    };

    if !buffer.is_empty() && needed >= buffer.len() {
        trace!(needed, capacity = buffer.len(), "formatted output truncated");
    }
    needed
}

/// Render `template` without a size bound
///
/// The output is measured first and then rendered into a buffer of exactly
/// that size. The result carries no terminator. Same error policy as
/// [`vsnprint`].
#[must_use]
pub fn format_to_vec(template: &str, args: &[FormatArg<'_>]) -> Vec<u8>
{
    let rendered = prepare(template, args).and_then(|segments| {
        let needed = write_segments(&segments, &mut [])?;
        let requested = needed + 1;
        let mut out = Vec::new();
        out.try_reserve_exact(requested)
            .map_err(|_| FormatError::OutputAllocation { requested })?;
        out.resize(requested, 0);
        let written = write_segments(&segments, &mut out)?;
        out.truncate(written);
        Ok(out)
    });

    match rendered {
        Ok(rendered) => rendered,
        Err(err) => fail(template, &err),
    }
}

fn fail(template: &str, err: &FormatError) -> !
{
    crate::fatal!("Fatal formatting error with format '{template}': {err}")
}

/// Render into `buffer` with a fixed argument list
///
/// Each argument is converted with [`FormatArg::from`] and the call is
/// forwarded to [`vsnprint`](crate::format::vsnprint).
///
/// ```rust
/// use hostpal_core::snprint;
///
/// let mut buffer = [0u8; 8];
/// assert_eq!(snprint!(&mut buffer, "%s=%x", "id", 255u32), 5);
/// assert_eq!(&buffer[..6], b"id=ff\0");
/// ```
#[macro_export]
macro_rules! snprint {
    ($buffer:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::format::vsnprint($buffer, $template, &[$($crate::format::FormatArg::from($arg)),*])
    };
}

/// Largest total length the C formatter can report
const MAX_OUTPUT: usize = libc::c_int::MAX as usize;

/// A template piece with its arguments already taken and converted
enum Segment<'t>
{
    Literal(&'t [u8]),
    Native
    {
        directive: String,
        resolved: CString,
        value: NativeValue,
    },
}

/// Parse `template` and bind every conversion to its argument
///
/// Nothing is written here, so template and argument errors leave the
/// caller's buffer as it was.
fn prepare<'t>(template: &'t str, args: &[FormatArg<'_>]) -> Result<Vec<Segment<'t>>, FormatError>
{
    let mut cursor = ArgCursor { args, next: 0 };

    parse(template)?
        .into_iter()
        .map(|piece| match piece {
            Piece::Literal(text) => Ok(Segment::Literal(text.as_bytes())),
            Piece::Percent => Ok(Segment::Literal(b"%")),
            Piece::Conversion(conversion) => prepare_conversion(&conversion, &mut cursor),
        })
        .collect()
}

/// Write `segments` into `buffer` the way `snprintf` would
///
/// Each segment goes straight into the space left in `buffer`. Returns the
/// untruncated length, which may not exceed [`MAX_OUTPUT`].
fn write_segments(segments: &[Segment<'_>], buffer: &mut [u8]) -> Result<usize, FormatError>
{
    let room = buffer.len().saturating_sub(1);
    let mut total = 0usize;

    for segment in segments {
        let at = total.min(room);
        let produced = match segment {
            Segment::Literal(bytes) => {
                let n = bytes.len().min(room - at);
                buffer[at..at + n].copy_from_slice(&bytes[..n]);
                bytes.len()
            }
            Segment::Native {
                directive,
                resolved,
                value,
            } => native::render_into(resolved, value, &mut buffer[at..]).map_err(|code| FormatError::Native {
                code,
                directive: directive.clone(),
            })?,
        };
        total = total
            .checked_add(produced)
            .filter(|&total| total <= MAX_OUTPUT)
            .ok_or(FormatError::Overflow { limit: MAX_OUTPUT })?;
    }

    if let Some(end) = buffer.get_mut(total.min(room)) {
        *end = 0;
    }
    Ok(total)
}

struct ArgCursor<'s, 'a>
{
    args: &'s [FormatArg<'a>],
    next: usize,
}

impl<'s, 'a> ArgCursor<'s, 'a>
{
    fn take(&mut self) -> Result<(usize, &'s FormatArg<'a>), FormatError>
    {
        let index = self.next;
        let arg = self.args.get(index).ok_or(FormatError::MissingArgument { index })?;
        self.next += 1;
        Ok((index, arg))
    }
}

fn prepare_conversion<'t>(conversion: &Conversion, cursor: &mut ArgCursor<'_, '_>) -> Result<Segment<'t>, FormatError>
{
    let directive = conversion.directive();

    // `*` counts come before the value, width first
    let width = match conversion.width {
        Count::FromArg => Some(take_count(cursor, &directive)?),
        _ => None,
    };
    let precision = match conversion.precision {
        Some(Count::FromArg) => Some(take_count(cursor, &directive)?),
        _ => None,
    };

    let (index, arg) = cursor.take()?;
    let expected = conversion.kind().expects();
    let value = match native_value(conversion, arg) {
        Some(Converted::Value(value)) => value,
        Some(Converted::Str(bytes)) => {
            let copy = crate::strings::strndup(bytes, bytes.len()).map_err(|_| FormatError::Allocation {
                index,
                requested: bytes.len().saturating_add(1),
            })?;
            NativeValue::Str(copy)
        }
        None => return Err(mismatch(index, arg, &directive, expected)),
    };

    let resolved = resolve_directive(conversion, width, precision);
    let resolved = CString::new(resolved.clone()).map_err(|_| FormatError::Native {
        code: -1,
        directive: resolved,
    })?;
    Ok(Segment::Native {
        directive,
        resolved,
        value,
    })
}

fn take_count(cursor: &mut ArgCursor<'_, '_>, directive: &str) -> Result<i64, FormatError>
{
    let (index, arg) = cursor.take()?;
    arg.as_i64().ok_or_else(|| mismatch(index, arg, directive, "an integer"))
}

fn mismatch(index: usize, arg: &FormatArg<'_>, directive: &str, expected: &'static str) -> FormatError
{
    FormatError::ArgumentMismatch {
        index,
        directive: directive.to_string(),
        expected,
        found: arg.type_name(),
    }
}

enum Converted<'a>
{
    Value(NativeValue),
    Str(&'a [u8]),
}

/// Convert `arg` to the C type `conversion` expects, or `None` on mismatch
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn native_value<'a>(conversion: &Conversion, arg: &FormatArg<'a>) -> Option<Converted<'a>>
{
    let value = match conversion.kind() {
        ConversionKind::Signed => {
            let v = arg.as_i64()?;
            match conversion.length {
                // hh and h are promoted to int; the C library narrows them
                Length::Default | Length::Char | Length::Short => NativeValue::Int(v as libc::c_int),
                Length::Long => NativeValue::Long(v as libc::c_long),
                Length::LongLong => NativeValue::LongLong(v as libc::c_longlong),
                Length::Max => NativeValue::IntMax(v as libc::intmax_t),
                Length::Size => NativeValue::SSize(v as libc::ssize_t),
                Length::PtrDiff => NativeValue::PtrDiff(v as libc::ptrdiff_t),
            }
        }
        ConversionKind::Unsigned => {
            let v = arg.as_u64()?;
            match conversion.length {
                Length::Default | Length::Char | Length::Short => NativeValue::UInt(v as libc::c_uint),
                Length::Long => NativeValue::ULong(v as libc::c_ulong),
                Length::LongLong => NativeValue::ULongLong(v as libc::c_ulonglong),
                Length::Max => NativeValue::UIntMax(v as libc::uintmax_t),
                Length::Size => NativeValue::Size(v as libc::size_t),
                Length::PtrDiff => NativeValue::PtrDiff(v as libc::ptrdiff_t),
            }
        }
        ConversionKind::Float => match *arg {
            FormatArg::Float(v) => NativeValue::Double(v),
            _ => return None,
        },
        ConversionKind::Char => match *arg {
            FormatArg::Char(c) if c.is_ascii() => NativeValue::Int(c as libc::c_int),
            FormatArg::Int(_) | FormatArg::UInt(_) => NativeValue::Int(arg.as_i64()? as libc::c_int),
            _ => return None,
        },
        ConversionKind::Str => match *arg {
            FormatArg::Str(bytes) => return Some(Converted::Str(bytes)),
            _ => return None,
        },
        ConversionKind::Pointer => match *arg {
            FormatArg::Ptr(p) => NativeValue::Ptr(p),
            _ => return None,
        },
    };
    Some(Converted::Value(value))
}

/// Directive with `*` counts replaced by their argument values
///
/// A negative width becomes the `-` flag, a negative precision is dropped,
/// matching how C treats them.
fn resolve_directive(conversion: &Conversion, width: Option<i64>, precision: Option<i64>) -> String
{
    let mut out = String::from("%");
    out.push_str(&conversion.flags);

    match (conversion.width, width) {
        (Count::Fixed(n), _) => out.push_str(&n.to_string()),
        (Count::FromArg, Some(w)) => {
            if w < 0 {
                out.push('-');
            }
            out.push_str(&clamp_count(w.unsigned_abs()).to_string());
        }
        _ => {}
    }

    match (conversion.precision, precision) {
        (Some(Count::Fixed(n)), _) => {
            out.push('.');
            out.push_str(&n.to_string());
        }
        (Some(Count::FromArg), Some(p)) if p >= 0 => {
            out.push('.');
            out.push_str(&clamp_count(p.unsigned_abs()).to_string());
        }
        _ => {}
    }

    out.push_str(conversion.length.as_str());
    out.push(conversion.conversion);
    out
}

/// `*` arguments are C ints
fn clamp_count(n: u64) -> u64
{
    n.min(i32::MAX.unsigned_abs().into())
}
