//! Fill placeholder text in PPTX presentations and convert them to PDF.
//!
//! Two single-shot operations:
//! - [`replace_text`] — open a presentation, substitute a placeholder inside
//!   every text run, write the result to a new file;
//! - [`convert::PdfConverter`] — hand a presentation file to an external
//!   headless converter and move its output to the requested path.

pub mod convert;
pub mod error;
pub mod pptx;

use std::path::Path;

use tracing::{error, info};

pub use convert::{LibreOfficeConverter, PdfConverter};
pub use error::{ConvertError, DocumentError};
pub use pptx::Presentation;

/// Replace every occurrence of `placeholder` in the presentation at
/// `document_path` with `replacement` and save the result to `output_path`.
///
/// The input file is never mutated; the output file is written whole or not
/// at all. Returns the number of runs that changed.
pub fn replace_text(
    document_path: impl AsRef<Path>,
    placeholder: &str,
    replacement: &str,
    output_path: impl AsRef<Path>,
) -> Result<usize, DocumentError> {
    let output_path = output_path.as_ref();
    let result: Result<usize, DocumentError> = (|| {
        let mut presentation = Presentation::open(document_path)?;
        let replaced = presentation.replace_text(placeholder, replacement)?;
        presentation.save(output_path)?;
        Ok(replaced)
    })();

    match &result {
        Ok(replaced) => info!(
            "replaced placeholder text in {replaced} run(s), saved to {}",
            output_path.display()
        ),
        Err(e) => error!("failed to replace placeholder text: {e}"),
    }
    result
}
