//! Classification of failed engine runs by the markers in their output.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureClass {
    /// A `-c` parameter or config file named something the engine doesn't know.
    ParameterNotFound,
    /// The image exceeds the engine's size limit.
    OversizedInput,
    /// OSD found too little text to decide an orientation.
    TooFewCharacters,
    Unclassified,
}

/// Marker substring → class, checked in order.
pub const FAILURE_MARKERS: &[(&str, FailureClass)] = &[
    ("parameter not found", FailureClass::ParameterNotFound),
    ("Image too large", FailureClass::OversizedInput),
    (
        "Too few characters. Skipping this page",
        FailureClass::TooFewCharacters,
    ),
];

pub fn classify_failure(output: &str) -> FailureClass {
    FAILURE_MARKERS
        .iter()
        .find(|(marker, _)| output.contains(marker))
        .map(|(_, class)| *class)
        .unwrap_or(FailureClass::Unclassified)
}
