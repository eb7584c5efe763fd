use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening, editing, or saving a presentation.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("slide XML error in {entry}: {reason}")]
    Xml { entry: String, reason: String },
}

/// Errors that can occur while converting a presentation to PDF.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    ExitStatus {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("converter produced no output at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_error_display() {
        let err = DocumentError::Xml {
            entry: "ppt/slides/slide1.xml".to_string(),
            reason: "unexpected EOF".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "slide XML error in ppt/slides/slide1.xml: unexpected EOF"
        );
    }

    #[test]
    fn test_convert_error_missing_output_display() {
        let err = ConvertError::MissingOutput(PathBuf::from("out/deck.pdf"));
        assert_eq!(err.to_string(), "converter produced no output at out/deck.pdf");
    }

    #[test]
    fn test_document_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DocumentError = io.into();
        assert!(matches!(err, DocumentError::Io(_)));
    }
}
