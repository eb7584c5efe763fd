//! PDF conversion through an external headless office process.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{error, info};

use crate::error::ConvertError;

/// Capability to convert a presentation file into a fixed-layout PDF.
///
/// The external tool lives behind this trait so callers can swap or mock it
/// without spawning a real process.
pub trait PdfConverter {
    /// Convert `input` to a PDF at exactly `output`.
    ///
    /// The directory portion of `output` must already exist.
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError>;
}

/// Converter backed by a headless LibreOffice process.
///
/// LibreOffice writes its result using its own naming convention (input base
/// name, `.pdf` extension, inside `--outdir`), not the caller's requested
/// path. [`PdfConverter::convert`] computes that implied path and renames it
/// to the requested one after the process exits successfully.
pub struct LibreOfficeConverter {
    program: String,
}

impl LibreOfficeConverter {
    pub fn new() -> Self {
        Self {
            program: "libreoffice".to_string(),
        }
    }

    /// Use a different executable name, e.g. `soffice`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Probe whether the external tool is runnable on this system.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

impl Default for LibreOfficeConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfConverter for LibreOfficeConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let outdir = output_directory(output);

        let result = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg(input)
            .arg("--outdir")
            .arg(&outdir)
            .output()
            .map_err(|source| {
                error!("failed to launch `{}`: {source}", self.program);
                ConvertError::Spawn {
                    program: self.program.clone(),
                    source,
                }
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            error!(
                program = %self.program,
                status = %result.status,
                "PDF conversion failed: {stderr}"
            );
            return Err(ConvertError::ExitStatus {
                program: self.program.clone(),
                status: result.status,
                stderr,
            });
        }

        finalize_output(default_output_path(input, &outdir), output)?;

        info!(
            "converted {} to PDF at {}",
            input.display(),
            output.display()
        );
        Ok(())
    }
}

/// Move the tool's default-named output to the requested path.
///
/// The tool writes `<outdir>/<input-stem>.pdf`; the caller asked for
/// `output`. Both live in the same directory.
fn finalize_output(produced: PathBuf, output: &Path) -> Result<(), ConvertError> {
    if !produced.exists() {
        error!(
            "converter reported success but wrote nothing at {}",
            produced.display()
        );
        return Err(ConvertError::MissingOutput(produced));
    }
    if produced != output {
        std::fs::rename(&produced, output).map_err(|e| {
            error!(
                "failed to move {} to {}: {e}",
                produced.display(),
                output.display()
            );
            ConvertError::Io(e)
        })?;
    }
    Ok(())
}

/// Directory the external tool is pointed at: the parent of the requested
/// output, or the current directory when the path has none.
fn output_directory(output: &Path) -> PathBuf {
    match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Path where the external tool drops its result for `input` inside `outdir`:
/// same base name, `.pdf` extension.
pub fn default_output_path(input: &Path, outdir: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    outdir.join(stem).with_extension("pdf")
}
