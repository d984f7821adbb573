use super::version::Capabilities;
use crate::error::{OcrError, Result};
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

/// Page segmentation mode that runs orientation and script detection only.
pub const PSM_OSD_ONLY: u8 = 0;

/// Per-call engine settings. Validated on construction; the `with_*`
/// builders consume and return the value, so an invocation handed to an
/// invoker is never changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineInvocation {
    languages: Vec<String>,
    engine_mode: Option<u8>,
    page_seg_mode: Option<u8>,
    extra_config: Vec<String>,
    timeout: Duration,
}

/// What the engine should write for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Hocr,
    Pdf { text_only: bool },
}

impl EngineInvocation {
    pub fn new<I, S>(languages: I, timeout: Duration) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut langs: Vec<String> = Vec::new();
        for lang in languages {
            let lang = lang.as_ref().trim();
            if lang.is_empty() || lang.contains('+') {
                return Err(OcrError::InvalidInvocation(format!(
                    "invalid language code: {lang:?}"
                )));
            }
            if !langs.iter().any(|l| l == lang) {
                langs.push(lang.to_string());
            }
        }
        if langs.is_empty() {
            return Err(OcrError::InvalidInvocation(
                "at least one language is required".into(),
            ));
        }
        if timeout.is_zero() {
            return Err(OcrError::InvalidInvocation(
                "timeout must be greater than zero".into(),
            ));
        }
        Ok(Self {
            languages: langs,
            engine_mode: None,
            page_seg_mode: None,
            extra_config: Vec::new(),
            timeout,
        })
    }

    pub fn with_engine_mode(mut self, mode: Option<u8>) -> Self {
        self.engine_mode = mode;
        self
    }

    pub fn with_page_seg_mode(mut self, mode: Option<u8>) -> Self {
        self.page_seg_mode = mode;
        self
    }

    pub fn with_extra_config<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_config = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Same settings with a different deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(OcrError::InvalidInvocation(
                "timeout must be greater than zero".into(),
            ));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn engine_mode(&self) -> Option<u8> {
        self.engine_mode
    }

    pub fn page_seg_mode(&self) -> Option<u8> {
        self.page_seg_mode
    }

    pub fn extra_config(&self) -> &[String] {
        &self.extra_config
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Language selection and, where the engine supports it, engine mode.
    pub fn base_args(&self, caps: &Capabilities) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-l".into(), self.languages.join("+").into()];
        if let (Some(mode), true) = (self.engine_mode, caps.supports_engine_mode) {
            args.push("--oem".into());
            args.push(mode.to_string().into());
        }
        args
    }

    /// Arguments for orientation/script detection, printed to stdout.
    pub fn osd_args(&self, caps: &Capabilities, input: &Path) -> Vec<OsString> {
        let mut args = self.base_args(caps);
        args.push(caps.psm_flag.as_str().into());
        args.push(PSM_OSD_ONLY.to_string().into());
        args.push(input.into());
        args.push("stdout".into());
        args
    }

    /// Arguments for a full recognition run. `output_base` is the path the
    /// engine will append its own suffix to.
    pub fn render_args(
        &self,
        caps: &Capabilities,
        input: &Path,
        output_base: &Path,
        format: OutputFormat,
    ) -> Vec<OsString> {
        let mut args = self.base_args(caps);
        if let Some(psm) = self.page_seg_mode {
            args.push(caps.psm_flag.as_str().into());
            args.push(psm.to_string().into());
        }
        let format_name = match format {
            OutputFormat::Hocr => "hocr",
            OutputFormat::Pdf { text_only } => {
                if text_only {
                    args.push("-c".into());
                    args.push("textonly_pdf=1".into());
                }
                "pdf"
            }
        };
        args.push(input.into());
        args.push(output_base.into());
        args.push(format_name.into());
        args.extend(self.extra_config.iter().map(OsString::from));
        args
    }
}
