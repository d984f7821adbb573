use crate::cleanup::CleanupPolicy;
use crate::engine::{EngineCommand, EngineInvocation, Tesseract};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: Engine,
    #[serde(default)]
    pub render: Render,
    #[serde(default)]
    pub cleanup: Cleanup,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Engine {
    pub program: String,
    /// Arguments placed before Tesseract's own, for wrappers.
    pub program_args: Vec<String>,
    pub languages: Vec<String>,
    pub engine_mode: Option<u8>,
    pub page_seg_mode: Option<u8>,
    /// Trailing config tokens (config file names or `-c key=value` pairs).
    pub tessconfig: Vec<String>,
    pub timeout_seconds: f64,
    pub orientation_timeout_seconds: f64,
}
impl Default for Engine {
    fn default() -> Self {
        Self {
            program: "tesseract".into(),
            program_args: Vec::new(),
            languages: vec!["eng".into()],
            engine_mode: None,
            page_seg_mode: None,
            tessconfig: Vec::new(),
            timeout_seconds: 180.0,
            orientation_timeout_seconds: 60.0,
        }
    }
}

impl Engine {
    pub fn command(&self) -> EngineCommand {
        EngineCommand::new(&self.program).with_leading_args(&self.program_args)
    }

    /// The process-wide engine handle, installed from this section on first use.
    pub fn tesseract(&self) -> &'static Tesseract {
        Tesseract::install_shared(self.command())
    }

    /// Invocation for recognition runs.
    pub fn invocation(&self) -> Result<EngineInvocation> {
        let timeout = seconds(self.timeout_seconds, "engine.timeout_seconds")?;
        Ok(EngineInvocation::new(&self.languages, timeout)?
            .with_engine_mode(self.engine_mode)
            .with_page_seg_mode(self.page_seg_mode)
            .with_extra_config(self.tessconfig.iter().cloned()))
    }

    /// Invocation for orientation detection.
    pub fn orientation_invocation(&self) -> Result<EngineInvocation> {
        let timeout = seconds(
            self.orientation_timeout_seconds,
            "engine.orientation_timeout_seconds",
        )?;
        Ok(EngineInvocation::new(&self.languages, timeout)?.with_engine_mode(self.engine_mode))
    }
}

fn seconds(value: f64, key: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("{key} must be a positive number of seconds"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Render {
    pub text_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Cleanup {
    pub enabled: bool,
    pub program: String,
    pub args: Vec<String>,
    pub timeout_seconds: f64,
    pub on_failure: CleanupPolicy,
}
impl Default for Cleanup {
    fn default() -> Self {
        Self {
            enabled: false,
            program: "textcleaner".into(),
            args: ["-g", "-e", "stretch", "-f", "25", "-o", "10", "-u"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout_seconds: 120.0,
            on_failure: CleanupPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
