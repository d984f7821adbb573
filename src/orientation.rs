//! Page orientation via Tesseract's OSD-only mode.

use crate::engine::{EngineInvocation, EngineOutput, OrientationResult, RunOutcome, Tesseract};
use crate::error::{OcrError, Result};
use crate::failure::{classify_failure, FailureClass};
use crate::logclass;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const KEY_ORIENTATION: &str = "Orientation";
const KEY_ORIENTATION_DEGREES: &str = "Orientation in degrees";
const KEY_ROTATE: &str = "Rotate";
const KEY_CONFIDENCE: &str = "Orientation confidence";

/// The two OSD report layouts Tesseract has shipped, told apart by which
/// signature key is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsdSchema {
    /// Before 3.04.01: angles are counter-clockwise, `Orientation` is present
    /// and there is no `Rotate` line.
    CounterClockwise,
    /// 3.04.01 and later: `Orientation in degrees` is clockwise and a
    /// `Rotate` line is present.
    Clockwise,
}

impl OsdSchema {
    pub fn detect(osd: &BTreeMap<String, String>) -> Result<Self> {
        match (osd.contains_key(KEY_ORIENTATION), osd.contains_key(KEY_ROTATE)) {
            (true, false) => Ok(OsdSchema::CounterClockwise),
            (false, true) => Ok(OsdSchema::Clockwise),
            (true, true) => Err(OcrError::OrientationSchema(
                "both 'Orientation' and 'Rotate' present".into(),
            )),
            (false, false) => Err(OcrError::OrientationSchema(
                "neither 'Orientation' nor 'Rotate' present".into(),
            )),
        }
    }
}

/// Collect `key: value` lines. Lines with no colon or more than one are
/// skipped.
pub fn parse_osd_lines(output: &str) -> BTreeMap<String, String> {
    let mut osd = BTreeMap::new();
    for line in output.lines() {
        let parts: Vec<&str> = line.trim().splitn(3, ':').collect();
        if let [key, value] = parts.as_slice() {
            osd.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    osd
}

/// Turn OSD output into a clockwise angle and confidence.
pub fn parse_osd(output: &str) -> Result<OrientationResult> {
    let osd = parse_osd_lines(output);
    let (raw, angle) = match OsdSchema::detect(&osd)? {
        OsdSchema::CounterClockwise => {
            // Old builds print an index as `Orientation` and the degrees on a
            // separate line; very old ones only have `Orientation`.
            let key = if osd.contains_key(KEY_ORIENTATION_DEGREES) {
                KEY_ORIENTATION_DEGREES
            } else {
                KEY_ORIENTATION
            };
            let raw = parse_angle(&osd, key)?;
            (raw, (360 - raw.rem_euclid(360)) % 360)
        }
        OsdSchema::Clockwise => {
            let raw = parse_angle(&osd, KEY_ORIENTATION_DEGREES)?;
            (raw, raw.rem_euclid(360))
        }
    };
    if angle % 90 != 0 {
        return Err(OcrError::OrientationSchema(format!(
            "angle {raw} is not a multiple of 90"
        )));
    }

    let confidence = match osd.get(KEY_CONFIDENCE) {
        Some(v) => v.parse::<f32>().map_err(|_| {
            OcrError::OrientationSchema(format!("non-numeric {KEY_CONFIDENCE}: {v:?}"))
        })?,
        None => 0.0,
    };

    Ok(OrientationResult {
        angle: angle as u16,
        confidence: confidence.max(0.0),
    })
}

fn parse_angle(osd: &BTreeMap<String, String>, key: &str) -> Result<i32> {
    let value = osd
        .get(key)
        .ok_or_else(|| OcrError::OrientationSchema(format!("missing '{key}'")))?;
    value
        .parse()
        .map_err(|_| OcrError::OrientationSchema(format!("non-numeric '{key}': {value:?}")))
}

impl Tesseract {
    /// Estimate page rotation without running full recognition.
    ///
    /// Timeouts and pages the engine declines to analyze (too little text,
    /// image too large) yield [`OrientationResult::UNKNOWN`].
    pub fn detect_orientation(
        &self,
        input: &Path,
        invocation: &EngineInvocation,
    ) -> Result<OrientationResult> {
        let caps = self.capabilities()?;
        let page = self.page_number(input);
        let args = invocation.osd_args(&caps, input);

        let out = match self.run(&args, invocation.timeout())? {
            RunOutcome::TimedOut => {
                info!("{} orientation detection timed out", logclass::page_prefix(page));
                return Ok(OrientationResult::UNKNOWN);
            }
            RunOutcome::Finished(out) => out,
        };

        if !out.success() {
            return osd_failure(page, &out);
        }

        let result = parse_osd(&out.text)?;
        debug!(page, angle = result.angle, confidence = result.confidence, "orientation");
        Ok(result)
    }
}

fn osd_failure(page: u32, out: &EngineOutput) -> Result<OrientationResult> {
    logclass::log_output(&out.text, page);
    match classify_failure(&out.text) {
        FailureClass::TooFewCharacters | FailureClass::OversizedInput => {
            Ok(OrientationResult::UNKNOWN)
        }
        FailureClass::ParameterNotFound => Err(OcrError::Configuration {
            page,
            output: out.text.trim().to_string(),
        }),
        FailureClass::Unclassified => Err(OcrError::UnclassifiedEngineFailure {
            page,
            status: out.status.to_string(),
            output: out.text.trim().to_string(),
        }),
    }
}
