use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use lockbal::analysis::{FunctionChecker, LockCatalog};
use lockbal::output::{render_diagnostics, Diagnostic, OutputFormat};
use lockbal::parse::{parse_file, ParseError};
use rayon::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Static lock-balance checker for preprocessed C source.
#[derive(Parser)]
#[command(name = "lockbal")]
#[command(version, about, long_about = None)]
#[command(after_help = "FAMILIES:
    spl   splraise / spllower
    mpl   __mp_lock / __mp_unlock
    mtx   mtx_enter / mtx_leave")]
struct Cli {
    /// Preprocessed C files to check
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Restrict checking to the named lock families (repeatable)
    #[arg(short, long = "lock", value_name = "FAMILY")]
    locks: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One line per diagnostic
    Text,
    /// A JSON array of records
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let catalog = if cli.locks.is_empty() {
        LockCatalog::openbsd_defaults()
    } else {
        LockCatalog::openbsd_defaults().filtered(&cli.locks)?
    };

    // Files are independent; check them in parallel and print serially so
    // records never interleave.
    let results: Vec<(PathBuf, Result<Vec<Diagnostic>, ParseError>)> = cli
        .files
        .par_iter()
        .map(|path| (path.clone(), check_file(path, &catalog)))
        .collect();

    let mut diagnostics = Vec::new();
    let mut failed = false;
    for (path, result) in results {
        match result {
            Ok(found) => diagnostics.extend(found),
            Err(e) => {
                eprintln!("lockbal: {}: {}", path.display(), e);
                failed = true;
            }
        }
    }

    let rendered = render_diagnostics(&diagnostics, cli.format.into())?;
    if !rendered.is_empty() {
        println!("{}", rendered);
    }

    if failed || !diagnostics.is_empty() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn check_file(path: &PathBuf, catalog: &LockCatalog) -> Result<Vec<Diagnostic>, ParseError> {
    let unit = parse_file(path)?;
    tracing::info!(file = %path.display(), functions = unit.functions.len(), "parsed");
    Ok(FunctionChecker::new(catalog).check_unit(&unit, path))
}
