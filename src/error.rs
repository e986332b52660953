//! Error types for the img2latex library.
//!
//! Two error types reflect two distinct audiences:
//!
//! * [`Img2LatexError`]: failures of the conversion itself (missing image,
//!   inference endpoint down, no LaTeX in the model output, bad config).
//!   Returned from [`crate::generate::LatexGenerator::generate`] and the
//!   configuration builder.
//!
//! * [`UploadError`]: the caller sent a request the gateway refuses to
//!   process. Its `Display` text is exactly what the client sees.
//!
//! The HTTP layer maps both onto status codes in [`crate::server`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the conversion pipeline.
#[derive(Debug, Error)]
pub enum Img2LatexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The staged image vanished (or was never a regular file).
    #[error("Image file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    // ── Inference errors ──────────────────────────────────────────────────
    /// The inference endpoint was unreachable, timed out, returned a non-2xx
    /// status or a body that could not be decoded.
    #[error("Failed to generate LaTeX: {0}")]
    Generation(String),

    /// The model answered, but nothing in the answer looked like LaTeX.
    #[error("{}", crate::pipeline::postprocess::NO_CONTENT_MESSAGE)]
    NoLatexFound,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not stage or read a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Img2LatexError {
    /// `true` when the failure is attributable to the request rather than
    /// the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Img2LatexError::FileNotFound { .. })
    }
}

/// Validation failures for an inbound upload, checked in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("No file provided")]
    NoFile,

    #[error("No file selected")]
    EmptyFilename,

    #[error("Invalid file type")]
    InvalidFileType,

    #[error("Invalid content type")]
    InvalidContentType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_display_keeps_cause() {
        let e = Img2LatexError::Generation("connection refused".into());
        assert_eq!(e.to_string(), "Failed to generate LaTeX: connection refused");
    }

    #[test]
    fn file_not_found_is_client_error() {
        let e = Img2LatexError::FileNotFound {
            path: PathBuf::from("/tmp/missing.png"),
        };
        assert!(e.is_client_error());
        assert!(e.to_string().contains("/tmp/missing.png"));
        assert!(!Img2LatexError::NoLatexFound.is_client_error());
        assert_eq!(
            Img2LatexError::NoLatexFound.to_string(),
            "No valid LaTeX content found."
        );
    }

    #[test]
    fn upload_messages_match_wire_format() {
        assert_eq!(UploadError::NoFile.to_string(), "No file provided");
        assert_eq!(UploadError::EmptyFilename.to_string(), "No file selected");
        assert_eq!(UploadError::InvalidFileType.to_string(), "Invalid file type");
        assert_eq!(
            UploadError::InvalidContentType.to_string(),
            "Invalid content type"
        );
    }
}
