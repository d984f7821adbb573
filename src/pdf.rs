//! Single-page PDF rendering with fallback-page substitution.

use crate::cleanup::ImageCleanup;
use crate::engine::{EngineInvocation, OutputFormat, PageArtifact, RunOutcome, Tesseract};
use crate::error::{OcrError, Result};
use crate::failure::{classify_failure, FailureClass};
use crate::logclass;
use crate::null_artifact::write_blank_like;
use crate::util::{alias_file, remove_stale, replace_file, with_suffix};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Inputs for rendering one page.
#[derive(Debug, Clone)]
pub struct PdfPageRequest {
    pub input_image: PathBuf,
    /// Page to substitute when the engine cannot render this one.
    pub skip_pdf: PathBuf,
    pub output_pdf: PathBuf,
    /// Ask for an invisible text layer with no image.
    pub text_only: bool,
}

/// Substitute `skip_pdf` for a page the engine gave up on.
///
/// A full render becomes a link to the fallback page. A text-only render
/// becomes a blank page of the fallback's size, the equivalent of a text
/// layer with no text.
pub fn use_skip_page(text_only: bool, skip_pdf: &Path, output_pdf: &Path) -> Result<()> {
    if text_only {
        write_blank_like(skip_pdf, output_pdf)
    } else {
        alias_file(skip_pdf, output_pdf)?;
        Ok(())
    }
}

impl Tesseract {
    /// Render `req.input_image` as a single-page PDF at `req.output_pdf`.
    ///
    /// If `cleanup` is given the source image is cleaned in place first.
    pub fn generate_pdf(
        &self,
        req: &PdfPageRequest,
        invocation: &EngineInvocation,
        cleanup: Option<&ImageCleanup>,
    ) -> Result<PageArtifact> {
        let caps = self.capabilities()?;
        let page = self.page_number(&req.input_image);
        let text_only = req.text_only && caps.supports_text_only_render;
        if req.text_only && !text_only {
            warn!(
                "{} text-only PDF not supported by this tesseract; rendering full page",
                logclass::page_prefix(page)
            );
        }

        if let Some(cleanup) = cleanup {
            cleanup.apply(&req.input_image)?;
        }

        // Tesseract appends ".pdf" to the output base itself.
        let output_base = req.output_pdf.with_extension("");
        let written = with_suffix(&output_base, ".pdf");
        // A link from an earlier fallback would make the engine write into
        // the skip page, and a stale file would hide a missing output.
        remove_stale(&written)?;
        remove_stale(&req.output_pdf)?;
        let args = invocation.render_args(
            &caps,
            &req.input_image,
            &output_base,
            OutputFormat::Pdf { text_only },
        );
        let artifact = PageArtifact::Render(req.output_pdf.clone());

        let out = match self.run(&args, invocation.timeout())? {
            RunOutcome::TimedOut => {
                warn!("{} took too long to OCR - skipping", logclass::page_prefix(page));
                use_skip_page(text_only, &req.skip_pdf, &req.output_pdf)?;
                return Ok(artifact);
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
                    use_skip_page(text_only, &req.skip_pdf, &req.output_pdf)?;
                    Ok(artifact)
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

        if !written.exists() {
            return Err(OcrError::UnclassifiedEngineFailure {
                page,
                status: out.status.to_string(),
                output: format!("engine reported success but wrote no PDF at {}", written.display()),
            });
        }
        if written != req.output_pdf {
            debug!("normalizing {} -> {}", written.display(), req.output_pdf.display());
            replace_file(&written, &req.output_pdf)?;
        }
        Ok(artifact)
    }
}
