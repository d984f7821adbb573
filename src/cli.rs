use crate::{
    cleanup::ImageCleanup,
    config::Config,
    error::OcrError,
    pdf::PdfPageRequest,
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "tesspage")]
#[command(about = "Per-page Tesseract adapter (OSD + hOCR + PDF pages with timeout and fallback recovery)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./tesspage.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report engine version, capabilities and installed languages.
    Doctor {},
    /// Detect page orientation.
    Orient {
        #[arg(long)]
        input: PathBuf,
        /// Override engine.orientation_timeout_seconds.
        #[arg(long)]
        timeout: Option<f64>,
    },
    /// Write an hOCR document for one page image.
    Hocr {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Write a single-page PDF for one page image.
    Pdf {
        #[arg(long)]
        input: PathBuf,
        /// Page to use if the engine cannot render this one.
        #[arg(long)]
        skip_pdf: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Render only the invisible text layer.
        #[arg(long)]
        text_only: bool,
    },
}

/// Exit code for failures that halt a whole run rather than one page.
pub const EXIT_HALT: i32 = 2;

/// Map a dispatch error to a process exit code.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<OcrError>() {
        Some(e) if e.halts_run() => EXIT_HALT,
        _ => 1,
    }
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Orient { input, timeout } => orient(&cfg, input, *timeout),
        Command::Hocr { input, output } => hocr(&cfg, input, output),
        Command::Pdf {
            input,
            skip_pdf,
            output,
            text_only,
        } => pdf(&cfg, input, skip_pdf, output, *text_only || cfg.render.text_only),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("tesspage.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent).with_context(|| format!("create log dir: {}", parent.display()))?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn doctor(cfg: &Config) -> Result<()> {
    let tess = cfg.engine.tesseract();
    let version = tess.version()?;
    let caps = tess.capabilities()?;
    let languages = tess.languages()?;
    let missing: Vec<&String> = cfg
        .engine
        .languages
        .iter()
        .filter(|l| !languages.contains(*l))
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "program": tess.command().program(),
            "version": version,
            "capabilities": caps,
            "languages": languages,
            "missing_languages": missing,
            "checked_at": now_rfc3339(),
        }))?
    );
    Ok(())
}

fn orient(cfg: &Config, input: &Path, timeout: Option<f64>) -> Result<()> {
    validate_input(input)?;
    let tess = cfg.engine.tesseract();
    let mut invocation = cfg.engine.orientation_invocation()?;
    if let Some(secs) = timeout {
        let timeout = Duration::try_from_secs_f64(secs).with_context(|| "--timeout must be positive")?;
        invocation = invocation.with_timeout(timeout)?;
    }
    let result = tess.detect_orientation(input, &invocation)?;
    info!("orientation angle={} confidence={}", result.angle, result.confidence);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn hocr(cfg: &Config, input: &Path, output: &Path) -> Result<()> {
    validate_input(input)?;
    let tess = cfg.engine.tesseract();
    let invocation = cfg.engine.invocation()?;
    let artifact = tess
        .generate_hocr(input, output, &invocation)
        .with_context(|| format!("hOCR failed for {}", input.display()))?;
    println!("{}", serde_json::to_string_pretty(&artifact)?);
    Ok(())
}

fn pdf(cfg: &Config, input: &Path, skip_pdf: &Path, output: &Path, text_only: bool) -> Result<()> {
    validate_input(input)?;
    validate_input(skip_pdf)?;
    let tess = cfg.engine.tesseract();
    let invocation = cfg.engine.invocation()?;
    let cleanup = cfg
        .cleanup
        .enabled
        .then(|| ImageCleanup::from_config(&cfg.cleanup));
    let req = PdfPageRequest {
        input_image: input.to_path_buf(),
        skip_pdf: skip_pdf.to_path_buf(),
        output_pdf: output.to_path_buf(),
        text_only,
    };
    let artifact = tess
        .generate_pdf(&req, &invocation, cleanup.as_ref())
        .with_context(|| format!("PDF render failed for {}", input.display()))?;
    println!("{}", serde_json::to_string_pretty(&artifact)?);
    Ok(())
}

fn validate_input(input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }
    Ok(())
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    Some(PathBuf::from("tesspage.log"))
}
