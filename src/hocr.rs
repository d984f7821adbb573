//! hOCR page generation.

use crate::engine::{EngineInvocation, OutputFormat, PageArtifact, RunOutcome, Tesseract};
use crate::error::{OcrError, Result};
use crate::failure::{classify_failure, FailureClass};
use crate::logclass;
use crate::null_artifact::write_null_hocr;
use crate::util::{remove_stale, replace_file, with_suffix};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// Some Tesseract 3.x builds write the source filename into the page title
// unescaped, which breaks XML parsing whenever the name contains a quote.
static NESTED_FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"title='image "([^"]*)";"#).expect("static regex"));

const FILENAME_PLACEHOLDER: &str = r#"title='image " ";"#;

/// Replace an embedded source filename in one hOCR line with a placeholder.
pub fn repair_hocr_line(line: &str) -> String {
    NESTED_FILENAME_RE
        .replace_all(line, FILENAME_PLACEHOLDER)
        .into_owned()
}

/// Copy `raw` to `output`, repairing each line.
pub fn repair_hocr_file(raw: &Path, output: &Path) -> Result<()> {
    let reader = BufReader::new(File::open(raw)?);
    let mut writer = BufWriter::new(File::create(output)?);
    for line in reader.lines() {
        writeln!(writer, "{}", repair_hocr_line(&line?))?;
    }
    writer.flush()?;
    Ok(())
}

// 3.02 appends ".html" and later versions ".hocr" to the output base.
const ENGINE_SUFFIXES: [&str; 2] = [".html", ".hocr"];

/// Where the engine's unrepaired output goes. Never the same file as
/// `output`, since repair reads one while truncating the other.
fn raw_hocr_path(output: &Path) -> PathBuf {
    let raw = output.with_extension("badxml");
    if raw == output {
        with_suffix(output, ".badxml")
    } else {
        raw
    }
}

fn discard(path: &Path) {
    if let Err(err) = remove_stale(path) {
        warn!("could not remove {}: {}", path.display(), err);
    }
}

/// Remove whatever a killed or failed engine run may have left behind.
fn discard_intermediates(raw: &Path) {
    for suffix in ENGINE_SUFFIXES {
        discard(&with_suffix(raw, suffix));
    }
    discard(raw);
}

impl Tesseract {
    /// Recognize `input` and write an hOCR document to `output`.
    ///
    /// A page that times out or is too large for the engine gets a null
    /// hOCR document of the image's size instead.
    pub fn generate_hocr(
        &self,
        input: &Path,
        output: &Path,
        invocation: &EngineInvocation,
    ) -> Result<PageArtifact> {
        let caps = self.capabilities()?;
        let page = self.page_number(input);
        let raw = raw_hocr_path(output);
        let args = invocation.render_args(&caps, input, &raw, OutputFormat::Hocr);
        discard_intermediates(&raw);

        let out = match self.run(&args, invocation.timeout())? {
            RunOutcome::TimedOut => {
                warn!("{} took too long to OCR - skipping", logclass::page_prefix(page));
                discard_intermediates(&raw);
                write_null_hocr(input, output)?;
                return Ok(PageArtifact::Geometry(output.to_path_buf()));
            }
            RunOutcome::Finished(out) => out,
        };

        logclass::log_output(&out.text, page);

        if !out.success() {
            return match classify_failure(&out.text) {
                FailureClass::ParameterNotFound => Err(OcrError::Configuration {
                    page,
                    output: out.text.trim().to_string(),
                }),
                FailureClass::OversizedInput => {
                    discard_intermediates(&raw);
                    write_null_hocr(input, output)?;
                    Ok(PageArtifact::Geometry(output.to_path_buf()))
                }
                FailureClass::TooFewCharacters | FailureClass::Unclassified => {
                    Err(OcrError::UnclassifiedEngineFailure {
                        page,
                        status: out.status.to_string(),
                        output: out.text.trim().to_string(),
                    })
                }
            };
        }

        for suffix in ENGINE_SUFFIXES {
            let candidate = with_suffix(&raw, suffix);
            if candidate.exists() {
                debug!("normalizing {} -> {}", candidate.display(), raw.display());
                replace_file(&candidate, &raw)?;
                break;
            }
        }
        if !raw.exists() {
            return Err(OcrError::UnclassifiedEngineFailure {
                page,
                status: out.status.to_string(),
                output: format!("engine reported success but wrote no hOCR for {}", raw.display()),
            });
        }

        repair_hocr_file(&raw, output)?;
        discard(&raw);
        Ok(PageArtifact::Geometry(output.to_path_buf()))
    }
}
