use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Page rotation reported by orientation detection, always clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationResult {
    pub angle: u16,
    pub confidence: f32,
}

impl OrientationResult {
    /// "Assume upright, with no confidence", used whenever detection is skipped.
    pub const UNKNOWN: OrientationResult = OrientationResult {
        angle: 0,
        confidence: 0.0,
    };
}

/// A per-page artifact that exists and is well-formed once an invoker returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum PageArtifact {
    /// hOCR geometry/recognized-text document.
    Geometry(PathBuf),
    /// Single-page PDF.
    Render(PathBuf),
}

impl PageArtifact {
    pub fn path(&self) -> &Path {
        match self {
            PageArtifact::Geometry(p) | PageArtifact::Render(p) => p,
        }
    }
}
