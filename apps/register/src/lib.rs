//! # Till Register Library
//!
//! Terminal register for Till. Reads cashier commands from stdin, drives a
//! `till-core` checkout session and prints carts and receipts.
//!
//! ## Module Organization
//! ```text
//! till_register/
//! ├── lib.rs          ◄─── You are here (startup & command loop)
//! ├── config.rs       ◄─── RegisterConfig (TOML + env overrides)
//! ├── commands.rs     ◄─── Command parsing and the Register
//! ├── render.rs       ◄─── Cart and receipt text
//! └── error.rs        ◄─── AppError for commands and startup
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod render;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commands::{Register, Reply};
use config::RegisterConfig;
use error::{AppError, AppResult};

/// Runs the register until `quit` or end of input.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Register Startup                                  │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │     • Default: info,till=debug, can be overridden with RUST_LOG         │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • --config <path>, TILL_CONFIG, or the platform config dir          │
/// │     • TILL_* environment overrides, then validation                     │
/// │                                                                         │
/// │  3. Serve ────────────────────────────────────────────────────────────► │
/// │     • One command per line; errors are printed and the loop goes on     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn run() -> AppResult<()> {
    init_tracing();

    info!("Starting Till register");

    let config_path = config_path_from_args(std::env::args().skip(1))?;
    let config = RegisterConfig::load(config_path)?;
    info!(
        store = %config.store.name,
        device_id = %config.device.id,
        tax_rate_bps = config.store.tax_rate_bps,
        products = config.catalog.len(),
        "Configuration loaded"
    );

    let mut register = Register::new(config)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    serve(&mut register, stdin.lock(), &mut stdout)
}

/// Reads commands from `input` and writes replies to `output`.
pub fn serve<R: BufRead, W: Write>(
    register: &mut Register,
    input: R,
    output: &mut W,
) -> AppResult<()> {
    writeln!(output, "{}", register.greeting())?;
    prompt(output)?;

    for line in input.lines() {
        let line = line?;
        match register.handle_line(&line) {
            Ok(Reply::Quit) => break,
            Ok(Reply::Text(text)) => {
                if !text.is_empty() {
                    writeln!(output, "{}", text.trim_end())?;
                }
            }
            Err(e) => {
                warn!(line = %line, error = %e, "Command rejected");
                writeln!(output, "error [{}]: {}", e.code(), e)?;
            }
        }
        if let Some(banner) = register.take_banner() {
            writeln!(output, "{}", banner)?;
        }
        prompt(output)?;
    }

    info!("Register closed");
    Ok(())
}

fn prompt<W: Write>(output: &mut W) -> io::Result<()> {
    write!(output, "> ")?;
    output.flush()
}

/// Extracts `--config <path>` (or `--config=<path>`) from the arguments.
fn config_path_from_args<I>(args: I) -> AppResult<Option<PathBuf>>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(arg) = args.next() else {
        return Ok(None);
    };

    if arg == "--config" || arg == "-c" {
        return args
            .next()
            .map(|path| Some(PathBuf::from(path)))
            .ok_or_else(|| AppError::parse("--config needs a path"));
    }
    if let Some(path) = arg.strip_prefix("--config=") {
        return Ok(Some(PathBuf::from(path)));
    }
    Err(AppError::parse(format!(
        "Unknown argument '{}'. Usage: till-register [--config <path>]",
        arg
    )))
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till_core=trace` - Show trace for the checkout engine only
/// - Default: INFO, DEBUG for till crates
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,till=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
