use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use slidefill::{LibreOfficeConverter, PdfConverter};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Append-mode log file written next to the working directory, alongside
/// console output.
const LOG_FILE: &str = "slidefill.log";

#[derive(Parser)]
#[command(
    name = "slidefill",
    version,
    about = "Replace placeholder text in a PPTX file and convert it to PDF"
)]
struct Cli {
    /// Path to the PPTX template file
    #[arg(long, default_value = "template.pptx")]
    pptx: PathBuf,

    /// Placeholder text to replace
    #[arg(long, default_value = "placeholder_text")]
    placeholder: String,

    /// Text to replace the placeholder with
    #[arg(long, default_value = "Replacement Text")]
    replacement: String,

    /// Delete the intermediary PPTX file after conversion
    #[arg(long)]
    delete_intermediary: bool,

    /// Directory for output files
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

fn main() {
    if let Err(err) = run() {
        error!("{err:#}");
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    execute(&cli, &LibreOfficeConverter::new())
}

/// The replace → convert → delete pipeline, with the converter behind its
/// trait so tests can run it without a LibreOffice install.
fn execute(cli: &Cli, converter: &dyn PdfConverter) -> Result<()> {
    fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating output directory {:?}", cli.output_dir))?;

    let (modified, pdf) = derived_paths(&cli.pptx, &cli.output_dir)?;

    slidefill::replace_text(&cli.pptx, &cli.placeholder, &cli.replacement, &modified)
        .with_context(|| format!("replacing placeholder text in {:?}", cli.pptx))?;

    converter
        .convert(&modified, &pdf)
        .with_context(|| format!("converting {modified:?} to PDF"))?;

    if cli.delete_intermediary {
        fs::remove_file(&modified)
            .with_context(|| format!("deleting intermediary file {modified:?}"))?;
        info!("deleted intermediary PPTX file {:?}", modified);
    }

    println!("Converted: {:?} -> {:?}", cli.pptx, pdf);
    Ok(())
}

/// Console plus append-mode file logging, configured once at startup.
fn init_logging() -> Result<()> {
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .with_context(|| format!("opening log file {LOG_FILE:?}"))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(log_file)))
        .init();
    Ok(())
}

/// Paths for the two generated files:
/// `<output-dir>/modified_<basename>` and `<output-dir>/modified_<stem>.pdf`.
fn derived_paths(pptx: &Path, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let basename = pptx
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("input path {pptx:?} has no file name"))?;
    let stem = pptx
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(basename);

    let modified = output_dir.join(format!("modified_{basename}"));
    let pdf = output_dir.join(format!("modified_{stem}.pdf"));
    Ok((modified, pdf))
}
