use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use hostpal_core::error::{PlatformError, PlatformResult};
use hostpal_core::format::{self, ConversionKind, Count, FormatArg, Piece};
use hostpal_core::service_context::{NamespaceConnector, ServiceContextProvider};
use hostpal_core::strings::{strndup, strnlen};
use hostpal_utils::{debug, init_logging, init_logging_to_file, LogLevel};

/// Exercise the Hostpal platform primitives from the command line.
#[derive(Parser, Debug)]
#[command(name = "hostpal")]
#[command(version)]
#[command(about = "Exercise the Hostpal platform primitives", long_about = None)]
struct Cli
{
    /// Write logs to ~/.hostpal/<date>-hostpal.log instead of stdout
    #[arg(long, global = true, default_value_t = false)]
    log_file: bool,

    /// Log level used with --log-file (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Bounded length of TEXT
    Strnlen
    {
        /// Input text
        text: String,
        /// Maximum number of bytes to scan
        n: usize,
    },
    /// Bounded copy of TEXT
    Strndup
    {
        /// Input text
        text: String,
        /// Maximum number of bytes to copy
        n: usize,
    },
    /// Render a printf template into a buffer of CAPACITY bytes
    Format
    {
        /// Buffer capacity, including the terminator
        capacity: usize,
        /// printf-style template
        template: String,
        /// Arguments, parsed according to the template's conversions
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Acquire the service directory and optionally open a protocol in it
    Context
    {
        /// Directory to open instead of HOSTPAL_SVC_DIR or /svc
        #[arg(long)]
        path: Option<PathBuf>,
        /// Protocol entry to open inside the directory
        #[arg(long)]
        protocol: Option<String>,
    },
}

fn main()
{
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn setup_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>>
{
    if cli.log_file {
        let level = cli.log_level.as_deref().map(str::parse::<LogLevel>).transpose()?;
        let path = init_logging_to_file(level)?;
        eprintln!("Logging to {}", path.display());
    } else {
        init_logging()?;
    }
    Ok(())
}

fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    match cli.command {
        Commands::Strnlen { text, n } => {
            println!("{}", strnlen(text.as_bytes(), n));
        }
        Commands::Strndup { text, n } => {
            let copy = strndup(text.as_bytes(), n)?;
            println!("{}", copy.to_string_lossy());
        }
        Commands::Format {
            capacity,
            template,
            args,
        } => {
            let typed = typed_args(&template, &args)?;
            let mut buffer = allocate_buffer(capacity)?;
            let needed = format::vsnprint(&mut buffer, &template, &typed);
            let written = needed.min(capacity.saturating_sub(1));
            debug!(needed, written, capacity, "rendered template");

            println!("{}", String::from_utf8_lossy(&buffer[..written]));
            println!("needed {needed} bytes, wrote {written}");
        }
        Commands::Context { path, protocol } => {
            let connector = path.map_or_else(NamespaceConnector::from_env, NamespaceConnector::new);
            let provider = ServiceContextProvider::new(connector);
            let context = provider.get()?;
            println!("Service directory: {}", context.path().display());

            if let Some(name) = protocol {
                context.open_protocol(&name)?;
                println!("Opened protocol {name}");
            }
        }
    }
    Ok(())
}

/// Zeroed output buffer of `capacity` bytes, failing instead of aborting
fn allocate_buffer(capacity: usize) -> PlatformResult<Vec<u8>>
{
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(capacity)
        .map_err(|_| PlatformError::AllocationFailure { requested: capacity })?;
    buffer.resize(capacity, 0);
    Ok(buffer)
}

/// Parse command-line strings into the argument types `template` expects
///
/// The template is checked here so a bad one is reported as a usage error
/// rather than reaching the formatter.
fn typed_args<'a>(template: &str, raw: &'a [String]) -> Result<Vec<FormatArg<'a>>, Box<dyn std::error::Error>>
{
    let mut expected = Vec::new();
    for piece in format::parse(template)? {
        if let Piece::Conversion(conversion) = piece {
            if conversion.width == Count::FromArg {
                expected.push(ConversionKind::Signed);
            }
            if conversion.precision == Some(Count::FromArg) {
                expected.push(ConversionKind::Signed);
            }
            expected.push(conversion.kind());
        }
    }

    if raw.len() < expected.len() {
        return Err(format!("template expects {} arguments, got {}", expected.len(), raw.len()).into());
    }

    expected
        .iter()
        .zip(raw)
        .map(|(kind, text)| parse_arg(*kind, text))
        .collect()
}

fn parse_arg(kind: ConversionKind, text: &str) -> Result<FormatArg<'_>, Box<dyn std::error::Error>>
{
    let arg = match kind {
        ConversionKind::Signed => FormatArg::Int(text.parse()?),
        ConversionKind::Unsigned => FormatArg::UInt(parse_unsigned(text)?),
        ConversionKind::Float => FormatArg::Float(text.parse()?),
        ConversionKind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => FormatArg::Char(c),
                _ => return Err(format!("expected a single ASCII character, got {text:?}").into()),
            }
        }
        ConversionKind::Str => FormatArg::from(text),
        ConversionKind::Pointer => {
            let address = usize::try_from(parse_unsigned(text)?)?;
            FormatArg::Ptr(std::ptr::null::<u8>().wrapping_add(address).cast())
        }
    };
    Ok(arg)
}

fn parse_unsigned(text: &str) -> Result<u64, std::num::ParseIntError>
{
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_allocate_buffer_zeroed()
    {
        assert_eq!(allocate_buffer(4).unwrap(), vec![0u8; 4]);
        assert!(allocate_buffer(0).unwrap().is_empty());
    }

    #[test]
    fn test_allocate_buffer_reports_impossible_capacity()
    {
        match allocate_buffer(usize::MAX) {
            Err(PlatformError::AllocationFailure { requested }) => assert_eq!(requested, usize::MAX),
            other => panic!("Expected AllocationFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_typed_args_follow_template()
    {
        let raw = vec!["5".to_string(), "-3".to_string(), "0x1f".to_string(), "name".to_string()];
        let typed = typed_args("%*d %x %s", &raw).unwrap();
        assert_eq!(typed, vec![
            FormatArg::Int(5),
            FormatArg::Int(-3),
            FormatArg::UInt(0x1f),
            FormatArg::Str(b"name"),
        ]);
    }
}
