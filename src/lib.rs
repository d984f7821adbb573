pub mod cleanup;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod failure;
pub mod hocr;
pub mod logclass;
pub mod null_artifact;
pub mod orientation;
pub mod pdf;
pub mod util;

pub use engine::{
    Capabilities, EngineCommand, EngineInvocation, EngineVersion, OrientationResult, PageArtifact,
    PsmFlag, Tesseract,
};
pub use error::{OcrError, Result};
pub use pdf::PdfPageRequest;
