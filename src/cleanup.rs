//! Optional bi-level cleanup of a page image before PDF rendering.

use crate::config;
use crate::engine::{EngineCommand, RunOutcome};
use crate::error::{OcrError, Result};
use crate::util::{replace_file, with_suffix};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// What to do when the cleanup filter fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Fail the page.
    Propagate,
    /// Log a warning and render the original image.
    #[default]
    Skip,
}

/// External contrast-stretch and despeckle filter whose output replaces the
/// source image in place.
#[derive(Debug, Clone)]
pub struct ImageCleanup {
    command: EngineCommand,
    args: Vec<OsString>,
    timeout: Duration,
    policy: CleanupPolicy,
}

impl ImageCleanup {
    pub fn new(program: impl Into<std::path::PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            command: EngineCommand::new(program),
            args,
            timeout: DEFAULT_TIMEOUT,
            policy: CleanupPolicy::default(),
        }
    }

    pub fn from_config(cfg: &config::Cleanup) -> Self {
        Self {
            command: EngineCommand::new(&cfg.program),
            args: cfg.args.iter().map(OsString::from).collect(),
            timeout: Duration::try_from_secs_f64(cfg.timeout_seconds)
                .ok()
                .filter(|d| !d.is_zero())
                .unwrap_or(DEFAULT_TIMEOUT),
            policy: cfg.on_failure,
        }
    }

    pub fn with_policy(mut self, policy: CleanupPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> CleanupPolicy {
        self.policy
    }

    /// Clean `image` in place. Returns whether the image was replaced; with
    /// [`CleanupPolicy::Skip`] a failure leaves the image untouched and
    /// returns `Ok(false)`.
    pub fn apply(&self, image: &Path) -> Result<bool> {
        info!("Textcleaning {}", image.display());
        let cleaned = with_suffix(image, "-clean.png");
        match self.run_filter(image, &cleaned) {
            Ok(()) => {
                replace_file(&cleaned, image)?;
                Ok(true)
            }
            Err(reason) => {
                let _ = std::fs::remove_file(&cleaned);
                match self.policy {
                    CleanupPolicy::Propagate => Err(OcrError::CleanupFailed {
                        path: image.to_path_buf(),
                        reason,
                    }),
                    CleanupPolicy::Skip => {
                        warn!(
                            "image cleanup failed for {}; using original: {}",
                            image.display(),
                            reason
                        );
                        Ok(false)
                    }
                }
            }
        }
    }

    fn run_filter(&self, image: &Path, cleaned: &Path) -> std::result::Result<(), String> {
        let mut args = self.args.clone();
        args.push(image.into());
        args.push(cleaned.into());
        match self.command.run(&args, self.timeout) {
            Err(err) => Err(err.to_string()),
            Ok(RunOutcome::TimedOut) => Err(format!("timed out after {:?}", self.timeout)),
            Ok(RunOutcome::Finished(out)) if !out.success() => {
                Err(format!("exited with {}: {}", out.status, out.text.trim()))
            }
            Ok(RunOutcome::Finished(_)) if !cleaned.exists() => {
                Err(format!("no output written to {}", cleaned.display()))
            }
            Ok(RunOutcome::Finished(_)) => Ok(()),
        }
    }
}
