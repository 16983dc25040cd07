//! Command line and environment configuration.
//!
//! Every subcommand is a clap derive struct. Options that make sense to set
//! once per shell also read an environment variable:
//!
//! - `ACGEN_OUT_DIR`: extraction output directory
//! - `ACGEN_JOBS`: finalization workers
//! - `ACGEN_STRICT`: strict magic scanning
//! - `ACGEN_LOG_LEVEL`: log level when `RUST_LOG` is unset
//!
//! # Example
//!
//! ```
//! use acgen_extract::config::{Cli, Command};
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["acgen", "extract", "board.elf", "-o", "out", "--jobs", "2"]);
//! let Command::Extract(config) = cli.command else { unreachable!() };
//! config.validate().expect("valid configuration");
//! assert_eq!(config.workers().map(|j| j.get()), Some(2));
//! ```

use crate::error::ConfigError;
use crate::hexdump::{self, DEFAULT_PER_LINE, HexdumpOptions};
use acgen_formats::platform::Platform;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// ACPI table extraction and verification
#[derive(Debug, Parser)]
#[command(name = "acgen", version, about, long_about = None)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(
        short,
        long,
        global = true,
        env = "ACGEN_LOG_LEVEL",
        value_enum,
        default_value = "info"
    )]
    pub log_level: LogLevel,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract and finalize every table embedded in an artifact
    Extract(ExtractConfig),
    /// Verify finalized .aml files
    Verify(VerifyArgs),
    /// Print a file range as a C byte array
    Hexdump(HexdumpArgs),
    /// Write an artifact embedding a platform's built-in tables
    Author(AuthorArgs),
}

/// Log levels accepted by `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Progress messages
    Info,
    /// Per-record details
    Debug,
    /// Everything
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

/// Extraction report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per table
    #[default]
    Text,
    /// Pretty-printed JSON report
    Json,
}

/// `acgen extract`
#[derive(Debug, Clone, Args)]
pub struct ExtractConfig {
    /// Compiled artifact, or a directory of artifacts
    pub input: PathBuf,

    /// Directory receiving the .aml files
    #[arg(short, long, env = "ACGEN_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Finalization workers (defaults to available parallelism)
    #[arg(short, long, env = "ACGEN_JOBS")]
    pub jobs: Option<usize>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Skip start magics not followed by a plausible signature
    #[arg(long, env = "ACGEN_STRICT")]
    pub strict: bool,
}

impl ExtractConfig {
    /// Check settings clap cannot express
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `jobs` is zero
    /// - `out_dir` exists and is not a directory
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == Some(0) {
            return Err(ConfigError::ZeroJobs);
        }
        if self.out_dir.exists() && !self.out_dir.is_dir() {
            return Err(ConfigError::OutputNotDirectory(self.out_dir.clone()));
        }
        Ok(())
    }

    /// Validated worker count
    pub fn workers(&self) -> Option<NonZeroUsize> {
        self.jobs.and_then(NonZeroUsize::new)
    }
}

/// `acgen verify`
#[derive(Debug, Clone, Args)]
pub struct VerifyArgs {
    /// Files or directories to verify
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// `acgen hexdump`
#[derive(Debug, Clone, Args)]
pub struct HexdumpArgs {
    /// Input file
    pub file: PathBuf,

    /// Start offset (0x hex accepted)
    #[arg(value_parser = hexdump::parse_int, default_value = "0")]
    pub offset: usize,

    /// Number of bytes to read (defaults to end of file)
    #[arg(value_parser = hexdump::parse_int)]
    pub size: Option<usize>,

    /// Number of bytes to read, overriding the positional size
    #[arg(short = 's', long = "size", value_parser = hexdump::parse_int)]
    pub size_opt: Option<usize>,

    /// Emit a C definition with this variable name
    #[arg(short, long)]
    pub name: Option<String>,

    /// C element type
    #[arg(short = 't', long = "type", default_value = "uint8_t")]
    pub ctype: String,

    /// Bytes per line
    #[arg(short, long, default_value_t = DEFAULT_PER_LINE)]
    pub per_line: NonZeroUsize,

    /// With --name, also emit NAME_len
    #[arg(short, long)]
    pub var_length: bool,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl HexdumpArgs {
    /// Effective byte count, `--size` winning over the positional one
    pub fn read_size(&self) -> Option<usize> {
        self.size_opt.or(self.size)
    }

    /// Rendering options
    pub fn options(&self) -> HexdumpOptions {
        HexdumpOptions {
            name: self.name.clone(),
            ctype: self.ctype.clone(),
            per_line: self.per_line,
            var_length: self.var_length,
        }
    }
}

/// `acgen author`
#[derive(Debug, Clone, Args)]
pub struct AuthorArgs {
    /// Platform whose tables to embed (sm8150, sm8850)
    pub platform: Platform,

    /// Artifact file to write
    #[arg(short, long)]
    pub output: PathBuf,
}
