//! `acgen` binary entry point.
//!
//! Thin wrapper around the acgen-extract library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Dispatches the subcommand
//! 4. Maps failures to `error[<Condition>]: <message>` and exit status 1

use acgen_extract::config::{
    AuthorArgs, Cli, Command, ExtractConfig, HexdumpArgs, OutputFormat, VerifyArgs,
};
use acgen_extract::{ExtractError, Extractor, author, hexdump, io, verify};
use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(cli.log_level.into()).into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            let condition = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<ExtractError>())
                .map_or("Error", ExtractError::condition);
            eprintln!("error[{condition}]: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Extract(config) => cmd_extract(&config),
        Command::Verify(args) => cmd_verify(&args),
        Command::Hexdump(args) => cmd_hexdump(&args),
        Command::Author(args) => cmd_author(&args),
    }
}

fn cmd_extract(config: &ExtractConfig) -> Result<ExitCode> {
    config.validate().map_err(ExtractError::from)?;

    tracing::debug!(
        input = %config.input.display(),
        out_dir = %config.out_dir.display(),
        jobs = ?config.jobs,
        strict = config.strict,
        "extracting"
    );

    let report = Extractor::new()
        .strict(config.strict)
        .jobs(config.workers())
        .run(&config.input, &config.out_dir)?;

    match config.format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json().map_err(ExtractError::from)?),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_verify(args: &VerifyArgs) -> Result<ExitCode> {
    let results = verify::verify_paths(&args.paths).map_err(ExtractError::from)?;

    let mut failed = 0usize;
    for result in &results {
        match result {
            Ok(verified) => println!("{verified}"),
            Err(err) => {
                failed += 1;
                println!("FAIL {err} [{}]", err.condition());
            }
        }
    }

    println!(
        "{} file(s) checked, {} passed, {failed} failed",
        results.len(),
        results.len() - failed
    );
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_hexdump(args: &HexdumpArgs) -> Result<ExitCode> {
    let data = io::load(&args.file).map_err(ExtractError::from)?;
    let bytes = hexdump::slice(&data, args.offset, args.read_size());
    let text = hexdump::render(bytes, &args.options());

    match &args.output {
        Some(path) => {
            let mut contents = text;
            if !contents.is_empty() && !contents.ends_with('\n') {
                contents.push('\n');
            }
            io::store(path, contents.as_bytes())
                .map_err(ExtractError::from)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_author(args: &AuthorArgs) -> Result<ExitCode> {
    let tables = author::write_platform_artifact(args.platform, &args.output)?;
    println!(
        "{}: {tables} table(s) embedded for {}",
        args.output.display(),
        args.platform
    );
    Ok(ExitCode::SUCCESS)
}
