use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the Tesseract adapter.
///
/// Timeouts and oversized-image rejections never appear here: the invokers
/// recover from those locally by substituting a placeholder artifact.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine could not be located or refused to report about itself.
    #[error("tesseract is not available: {0}")]
    MissingDependency(String),

    /// The engine rejected a configuration parameter it does not know.
    #[error("tesseract rejected a configuration parameter on page {page}: {output}")]
    Configuration { page: u32, output: String },

    #[error("tesseract failed on page {page} ({status}): {output}")]
    UnclassifiedEngineFailure {
        page: u32,
        status: String,
        output: String,
    },

    #[error("unexpected orientation output: {0}")]
    OrientationSchema(String),

    #[error("invalid engine invocation: {0}")]
    InvalidInvocation(String),

    #[error("image cleanup failed for {path:?}: {reason}")]
    CleanupFailed { path: PathBuf, reason: String },

    #[error("malformed PDF {path:?}: {reason}")]
    MalformedPdf { path: PathBuf, reason: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    /// True for failures that should stop the whole run rather than one page.
    pub fn halts_run(&self) -> bool {
        matches!(
            self,
            OcrError::MissingDependency(_) | OcrError::Configuration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OcrError>;
