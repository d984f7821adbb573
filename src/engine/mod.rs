pub mod invocation;
pub mod process;
pub mod types;
pub mod version;

use crate::error::{OcrError, Result};
use crate::util::page_number;
use once_cell::sync::OnceCell;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use invocation::{EngineInvocation, OutputFormat};
pub use process::{EngineCommand, EngineOutput, RunOutcome};
pub use types::{OrientationResult, PageArtifact};
pub use version::{Capabilities, EngineVersion, PsmFlag};

/// Deadline for `--version`, `--list-langs` and `--print-parameters`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Maps a page image path to the human-readable page number used in logs.
pub type PageResolver = fn(&Path) -> u32;

static SHARED: OnceCell<Tesseract> = OnceCell::new();

/// Handle to one Tesseract installation.
///
/// Version, capabilities and installed languages are queried at most once
/// per handle. Concurrent first callers block on the same initialization
/// and every later caller sees the cached value.
pub struct Tesseract {
    command: EngineCommand,
    page_resolver: PageResolver,
    version: OnceCell<EngineVersion>,
    capabilities: OnceCell<Capabilities>,
    languages: OnceCell<BTreeSet<String>>,
}

impl Tesseract {
    pub fn new(command: EngineCommand) -> Self {
        Self {
            command,
            page_resolver: page_number,
            version: OnceCell::new(),
            capabilities: OnceCell::new(),
            languages: OnceCell::new(),
        }
    }

    /// Process-wide handle. Unless [`Tesseract::install_shared`] ran first,
    /// this is the engine named by `$TESSERACT`, or `tesseract` on the PATH.
    pub fn shared() -> &'static Tesseract {
        SHARED.get_or_init(|| Tesseract::new(EngineCommand::new(default_program())))
    }

    /// Make `command` the process-wide engine. The first installation wins;
    /// a later one with a different command is ignored with a warning.
    pub fn install_shared(command: EngineCommand) -> &'static Tesseract {
        let mut installed = false;
        let tess = SHARED.get_or_init(|| {
            installed = true;
            Tesseract::new(command.clone())
        });
        if !installed && tess.command != command {
            warn!(
                "shared tesseract already set to {}; ignoring {}",
                tess.command.program().display(),
                command.program().display()
            );
        }
        tess
    }

    pub fn with_page_resolver(mut self, resolver: PageResolver) -> Self {
        self.page_resolver = resolver;
        self
    }

    pub fn command(&self) -> &EngineCommand {
        &self.command
    }

    pub fn page_number(&self, input: &Path) -> u32 {
        (self.page_resolver)(input)
    }

    pub fn version(&self) -> Result<&EngineVersion> {
        self.version.get_or_try_init(|| -> Result<EngineVersion> {
            let output = self.query("--version")?;
            let version = EngineVersion::parse(&output)?;
            info!("tesseract version {}", version);
            Ok(version)
        })
    }

    pub fn capabilities(&self) -> Result<Capabilities> {
        self.capabilities
            .get_or_try_init(|| -> Result<Capabilities> {
                let version = self.version()?;
                let parameters = if version.needs_textonly_probe() {
                    Some(self.query("--print-parameters")?)
                } else {
                    None
                };
                let caps = Capabilities::derive(version, parameters.as_deref());
                debug!(?caps, "tesseract capabilities");
                Ok(caps)
            })
            .copied()
    }

    /// Languages the engine reports as installed.
    pub fn languages(&self) -> Result<&BTreeSet<String>> {
        self.languages.get_or_try_init(|| -> Result<BTreeSet<String>> {
            let output = self.query("--list-langs")?;
            Ok(parse_language_list(&output))
        })
    }

    pub(crate) fn run(&self, args: &[OsString], timeout: Duration) -> Result<RunOutcome> {
        self.command.run(args, timeout)
    }

    fn query(&self, flag: &str) -> Result<String> {
        let outcome = self.command.run(&[OsString::from(flag)], PROBE_TIMEOUT)?;
        match outcome {
            RunOutcome::Finished(out) if out.success() => Ok(out.text),
            RunOutcome::Finished(out) => Err(OcrError::MissingDependency(format!(
                "tesseract {flag} exited with {}: {}",
                out.status,
                out.text.trim()
            ))),
            RunOutcome::TimedOut => Err(OcrError::MissingDependency(format!(
                "tesseract {flag} did not answer within {:?}",
                PROBE_TIMEOUT
            ))),
        }
    }
}

/// Parse `--list-langs` output; the first line is a header.
pub fn parse_language_list(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_program() -> OsString {
    std::env::var_os("TESSERACT").unwrap_or_else(|| OsString::from("tesseract"))
}
