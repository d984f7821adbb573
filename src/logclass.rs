//! Triage of Tesseract's free-text diagnostics into log severities.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

pub const DIACRITICS_MESSAGE: &str = "lots of diacritics - possibly poor OCR";
pub const WEAK_MARGIN_MESSAGE: &str = "unsure about page orientation";

const IGNORED_PREFIXES: &[&str] = &["Tesseract Open Source", "Warning in pixReadMem"];
const WEAK_MARGIN_PREFIX: &str = "OSD: Weak margin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub page: u32,
    pub text: String,
}

impl LogLine {
    /// The message as handed to the log sink.
    pub fn message(&self) -> String {
        format!("{} {}", page_prefix(self.page), self.text)
    }
}

pub fn page_prefix(page: u32) -> String {
    format!("{page:04}: [tesseract]")
}

/// Classify a single line. The returned text is what should be logged,
/// which for some known lines is a fixed explanation instead of the line.
pub fn classify_line(line: &str) -> (LogLevel, String) {
    let trimmed = line.trim();
    if trimmed.is_empty() || IGNORED_PREFIXES.iter().any(|p| line.starts_with(p)) {
        return (LogLevel::Ignored, trimmed.to_string());
    }
    if line.contains("diacritics") {
        return (LogLevel::Warning, DIACRITICS_MESSAGE.to_string());
    }
    if line.starts_with(WEAK_MARGIN_PREFIX) {
        return (LogLevel::Warning, WEAK_MARGIN_MESSAGE.to_string());
    }
    let lower = line.to_lowercase();
    let level = if lower.contains("error") || lower.contains("exception") {
        LogLevel::Error
    } else if lower.contains("warning") {
        LogLevel::Warning
    } else if lower.contains("read_params_file") {
        LogLevel::Error
    } else {
        LogLevel::Info
    };
    (level, trimmed.to_string())
}

/// Classify every line of `output`, in order, tagging each with `page`.
pub fn classify(output: &str, page: u32) -> Vec<LogLine> {
    output
        .lines()
        .map(|line| {
            let (level, text) = classify_line(line);
            LogLine { level, page, text }
        })
        .collect()
}

/// Send classified lines to the log, dropping ignored ones.
pub fn emit(lines: &[LogLine]) {
    for line in lines {
        match line.level {
            LogLevel::Ignored => {}
            LogLevel::Info => info!("{}", line.message()),
            LogLevel::Warning => warn!("{}", line.message()),
            LogLevel::Error => error!("{}", line.message()),
        }
    }
}

/// Classify and log engine output for one page.
pub fn log_output(output: &str, page: u32) {
    emit(&classify(output, page));
}
