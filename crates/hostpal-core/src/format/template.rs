//! # Template Parsing
//!
//! Splits a printf-style template into literal text and conversion
//! specifications.
//!
//! Only the grammar needed to type-check arguments is understood here:
//!
//! ```text
//! %[flags][width][.precision][length]conversion
//! ```
//!
//! - flags: `-`, `+`, space, `#`, `0`, `'`
//! - width / precision: decimal digits or `*` (taken from the argument list)
//! - length: `hh`, `h`, `l`, `ll`, `j`, `z`, `t`
//! - conversion: `d i u o x X c s p f F e E g G a A`, plus `%%`
//!
//! Everything the native formatter would need the C type system for
//! (`%n`, `%ls`, `%lc`, `%Lf`, positional `%1$d`) is rejected.

use thiserror::Error;

/// Reasons a template cannot be rendered
///
/// These never reach callers of [`super::vsnprint`]; they end up in the
/// diagnostic of the fatal error it raises.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError
{
    /// The template ends in the middle of a conversion specification
    #[error("incomplete conversion specification at byte {offset}")]
    Truncated
    {
        /// Byte offset of the `%`
        offset: usize,
    },

    /// Unknown conversion character
    #[error("unknown conversion '%{conversion}' at byte {offset}")]
    UnknownConversion
    {
        /// The offending character
        conversion: char,
        /// Byte offset of the `%`
        offset: usize,
    },

    /// A conversion or modifier that has no typed-argument equivalent
    #[error("unsupported directive '{directive}' at byte {offset}")]
    Unsupported
    {
        /// The directive text, starting at `%`
        directive: String,
        /// Byte offset of the `%`
        offset: usize,
    },

    /// Width or precision does not fit in a C `int`
    #[error("width or precision out of range at byte {offset}")]
    CountOverflow
    {
        /// Byte offset of the `%`
        offset: usize,
    },

    /// More conversions than arguments
    #[error("missing argument #{index}")]
    MissingArgument
    {
        /// Zero-based argument index
        index: usize,
    },

    /// The argument type does not match its conversion
    #[error("argument #{index} is {found}, but '{directive}' expects {expected}")]
    ArgumentMismatch
    {
        /// Zero-based argument index
        index: usize,
        /// Conversion the argument was consumed by
        directive: String,
        /// What the conversion accepts
        expected: &'static str,
        /// What was passed
        found: &'static str,
    },

    /// A string argument could not be copied
    #[error("could not allocate {requested} bytes for argument #{index}")]
    Allocation
    {
        /// Zero-based argument index
        index: usize,
        /// Bytes requested
        requested: usize,
    },

    /// The native formatter reported an error
    #[error("native formatter returned {code} for '{directive}'")]
    Native
    {
        /// Negative return value of `snprintf`
        code: i32,
        /// The directive handed to the native formatter
        directive: String,
    },

    /// The complete output would be longer than a C `int` can report
    #[error("output length exceeds {limit} bytes")]
    Overflow
    {
        /// Largest length the formatter may return
        limit: usize,
    },

    /// The unbounded output buffer could not be allocated
    #[error("could not allocate {requested} bytes for the output")]
    OutputAllocation
    {
        /// Bytes requested
        requested: usize,
    },
}

/// One piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece<'a>
{
    /// Text copied verbatim
    Literal(&'a str),
    /// `%%`
    Percent,
    /// A conversion consuming one or more arguments
    Conversion(Conversion),
}

/// Width or precision of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count
{
    /// Not given
    Implied,
    /// Given as digits in the template
    Fixed(usize),
    /// `*`: taken from the next argument
    FromArg,
}

/// Length modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length
{
    /// No modifier
    Default,
    /// `hh`
    Char,
    /// `h`
    Short,
    /// `l`
    Long,
    /// `ll`
    LongLong,
    /// `j`
    Max,
    /// `z`
    Size,
    /// `t`
    PtrDiff,
}

impl Length
{
    /// Modifier as written in a template
    #[must_use]
    pub fn as_str(self) -> &'static str
    {
        match self {
            Length::Default => "",
            Length::Char => "hh",
            Length::Short => "h",
            Length::Long => "l",
            Length::LongLong => "ll",
            Length::Max => "j",
            Length::Size => "z",
            Length::PtrDiff => "t",
        }
    }
}

/// The argument type a conversion consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind
{
    /// `d`, `i`
    Signed,
    /// `u`, `o`, `x`, `X`
    Unsigned,
    /// `f`, `F`, `e`, `E`, `g`, `G`, `a`, `A`
    Float,
    /// `c`
    Char,
    /// `s`
    Str,
    /// `p`
    Pointer,
}

impl ConversionKind
{
    fn of(conversion: char) -> Option<Self>
    {
        match conversion {
            'd' | 'i' => Some(ConversionKind::Signed),
            'u' | 'o' | 'x' | 'X' => Some(ConversionKind::Unsigned),
            'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 'a' | 'A' => Some(ConversionKind::Float),
            'c' => Some(ConversionKind::Char),
            's' => Some(ConversionKind::Str),
            'p' => Some(ConversionKind::Pointer),
            _ => None,
        }
    }

    /// Human-readable description of accepted arguments
    #[must_use]
    pub fn expects(self) -> &'static str
    {
        match self {
            ConversionKind::Signed | ConversionKind::Unsigned => "an integer",
            ConversionKind::Float => "a float",
            ConversionKind::Char => "an ASCII character or integer",
            ConversionKind::Str => "a string",
            ConversionKind::Pointer => "a pointer",
        }
    }
}

/// A single conversion specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion
{
    /// Flag characters in template order
    pub flags: String,
    /// Minimum field width
    pub width: Count,
    /// Precision, if a `.` was present
    pub precision: Option<Count>,
    /// Length modifier
    pub length: Length,
    /// Conversion character
    pub conversion: char,
}

impl Conversion
{
    /// Argument type of the converted value
    #[must_use]
    pub fn kind(&self) -> ConversionKind
    {
        // Only constructed by the parser, which rejects unknown characters
        ConversionKind::of(self.conversion).unwrap_or(ConversionKind::Signed)
    }

    /// Number of arguments consumed, counting `*` width and precision
    #[must_use]
    pub fn arg_count(&self) -> usize
    {
        1 + usize::from(self.width == Count::FromArg) + usize::from(self.precision == Some(Count::FromArg))
    }

    /// The specification as written, e.g. `%-8.3lf`
    #[must_use]
    pub fn directive(&self) -> String
    {
        let mut out = String::from("%");
        out.push_str(&self.flags);
        push_count(&mut out, self.width);
        if let Some(precision) = self.precision {
            out.push('.');
            push_count(&mut out, precision);
        }
        out.push_str(self.length.as_str());
        out.push(self.conversion);
        out
    }
}

fn push_count(out: &mut String, count: Count)
{
    match count {
        Count::Implied => {}
        Count::Fixed(n) => out.push_str(&n.to_string()),
        Count::FromArg => out.push('*'),
    }
}

/// Parse a template into pieces
///
/// The template ends at its first NUL byte, as it would for the C library.
///
/// ## Errors
///
/// Returns a [`FormatError`] describing the first malformed or unsupported
/// conversion.
///
/// ## Example
///
/// ```rust
/// use hostpal_core::format::{parse, ConversionKind, Piece};
///
/// let pieces = parse("%d-%s")?;
/// assert_eq!(pieces.len(), 3);
/// assert!(matches!(&pieces[1], Piece::Literal("-")));
/// if let Piece::Conversion(conversion) = &pieces[2] {
///     assert_eq!(conversion.kind(), ConversionKind::Str);
/// }
/// # Ok::<(), hostpal_core::format::FormatError>(())
/// ```
pub fn parse(template: &str) -> Result<Vec<Piece<'_>>, FormatError>
{
    let template = template.split('\0').next().unwrap_or_default();
    let bytes = template.as_bytes();

    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        if literal_start < i {
            pieces.push(Piece::Literal(&template[literal_start..i]));
        }
        let (piece, next) = parse_directive(template, i)?;
        pieces.push(piece);
        i = next;
        literal_start = next;
    }

    if literal_start < bytes.len() {
        pieces.push(Piece::Literal(&template[literal_start..]));
    }

    Ok(pieces)
}

/// Parse the directive starting at the `%` at `offset`
fn parse_directive(template: &str, offset: usize) -> Result<(Piece<'static>, usize), FormatError>
{
    let bytes = template.as_bytes();
    let mut i = offset + 1;

    if bytes.get(i) == Some(&b'%') {
        return Ok((Piece::Percent, i + 1));
    }

    let mut flags = String::new();
    while let Some(&b) = bytes.get(i) {
        if !matches!(b, b'-' | b'+' | b' ' | b'#' | b'0' | b'\'') {
            break;
        }
        flags.push(char::from(b));
        i += 1;
    }

    let width = match bytes.get(i) {
        Some(b'*') => {
            i += 1;
            Count::FromArg
        }
        Some(b) if b.is_ascii_digit() => {
            let (n, next) = parse_digits(bytes, i, offset)?;
            if bytes.get(next) == Some(&b'$') {
                return Err(FormatError::Unsupported {
                    directive: template[offset..=next].to_string(),
                    offset,
                });
            }
            i = next;
            Count::Fixed(n)
        }
        _ => Count::Implied,
    };

    let precision = if bytes.get(i) == Some(&b'.') {
        i += 1;
        if bytes.get(i) == Some(&b'*') {
            i += 1;
            Some(Count::FromArg)
        } else {
            let (n, next) = parse_digits(bytes, i, offset)?;
            i = next;
            Some(Count::Fixed(n))
        }
    } else {
        None
    };

    let (length, next) = match (bytes.get(i), bytes.get(i + 1)) {
        (Some(b'h'), Some(b'h')) => (Length::Char, i + 2),
        (Some(b'h'), _) => (Length::Short, i + 1),
        (Some(b'l'), Some(b'l')) => (Length::LongLong, i + 2),
        (Some(b'l'), _) => (Length::Long, i + 1),
        (Some(b'j'), _) => (Length::Max, i + 1),
        (Some(b'z'), _) => (Length::Size, i + 1),
        (Some(b't'), _) => (Length::PtrDiff, i + 1),
        _ => (Length::Default, i),
    };
    i = next;

    let Some(conversion) = template[i..].chars().next() else {
        return Err(FormatError::Truncated { offset });
    };
    let end = i + conversion.len_utf8();
    let unsupported = || FormatError::Unsupported {
        directive: template[offset..end].to_string(),
        offset,
    };

    if matches!(conversion, 'n' | 'L' | 'q' | 'C' | 'S' | 'm') {
        return Err(unsupported());
    }
    let Some(kind) = ConversionKind::of(conversion) else {
        return Err(FormatError::UnknownConversion { conversion, offset });
    };

    let length_ok = match kind {
        ConversionKind::Signed | ConversionKind::Unsigned => true,
        ConversionKind::Float => matches!(length, Length::Default | Length::Long),
        ConversionKind::Char | ConversionKind::Str | ConversionKind::Pointer => length == Length::Default,
    };
    if !length_ok {
        return Err(unsupported());
    }

    let spec = Conversion {
        flags,
        width,
        precision,
        length,
        conversion,
    };
    Ok((Piece::Conversion(spec), end))
}

/// Parse a run of decimal digits that must fit in a C `int`
///
/// An empty run is zero, which is what C does for a bare `.` precision.
fn parse_digits(bytes: &[u8], start: usize, offset: usize) -> Result<(usize, usize), FormatError>
{
    let mut value: usize = 0;
    let mut i = start;
    while let Some(&b) = bytes.get(i) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(usize::from(b - b'0')))
            .filter(|&v| i32::try_from(v).is_ok())
            .ok_or(FormatError::CountOverflow { offset })?;
        i += 1;
    }
    Ok((value, i))
}
