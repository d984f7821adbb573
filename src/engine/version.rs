use crate::error::{OcrError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pre-release build in which text-only PDF output may or may not exist.
pub const TEXTONLY_PROBE_VERSION: &str = "4.00.00alpha";

/// Parameter name that marks text-only PDF support in `--print-parameters`.
pub const TEXTONLY_PARAMETER: &str = "textonly_pdf";

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^tesseract\s+(.+?)\s*$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineVersion(String);

impl EngineVersion {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Extract the version from `--version` output: the rest of the first
    /// line that reads `tesseract <version>`.
    pub fn parse(output: &str) -> Result<Self> {
        VERSION_RE
            .captures(output)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| {
                OcrError::MissingDependency(format!(
                    "could not find a version in tesseract output: {}",
                    output.trim()
                ))
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading numeric component, e.g. 3 for "3.05.02" and 4 for "4.00.00alpha".
    pub fn major(&self) -> Option<u32> {
        let digits: String = self
            .0
            .trim_start_matches(['v', 'V'])
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }

    pub fn is_v4_or_later(&self) -> bool {
        self.major().is_some_and(|m| m >= 4)
    }

    /// Whether text-only support must be confirmed via `--print-parameters`.
    pub fn needs_textonly_probe(&self) -> bool {
        self.0 == TEXTONLY_PROBE_VERSION
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Spelling of the page segmentation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PsmFlag {
    /// `--psm`, Tesseract 4 and later.
    Long,
    /// `-psm`, Tesseract 3.
    Short,
}

impl PsmFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            PsmFlag::Long => "--psm",
            PsmFlag::Short => "-psm",
        }
    }
}

/// Version-dependent behavior, computed once per engine and passed to every
/// invocation builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_engine_mode: bool,
    pub psm_flag: PsmFlag,
    pub supports_text_only_render: bool,
}

impl Capabilities {
    /// Derive capabilities from a version. `parameters` is the output of
    /// `--print-parameters` and is only consulted for the pre-release build
    /// that needs it.
    pub fn derive(version: &EngineVersion, parameters: Option<&str>) -> Self {
        let v4 = version.is_v4_or_later();
        let supports_text_only_render = if version.needs_textonly_probe() {
            parameters.is_some_and(|p| p.contains(TEXTONLY_PARAMETER))
        } else {
            v4
        };
        Self {
            supports_engine_mode: v4,
            psm_flag: if v4 { PsmFlag::Long } else { PsmFlag::Short },
            supports_text_only_render,
        }
    }
}
