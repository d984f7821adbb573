use crate::error::{OcrError, Result};
use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The program used to launch the engine, plus any arguments that must
/// precede the engine's own (an interpreter running a wrapper script, `nice`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

/// Exit status and combined stdout+stderr of a finished engine run.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub status: ExitStatus,
    pub text: String,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Finished(EngineOutput),
    /// The child exceeded its deadline and was killed.
    TimedOut,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Run the engine with `args`, killing it once `timeout` elapses.
    pub fn run(&self, args: &[OsString], timeout: Duration) -> Result<RunOutcome> {
        debug!(
            "tesseract run {} {:?} timeout={:?}",
            self.program.display(),
            args,
            timeout
        );
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // Own process group, so a timeout also reaches wrapper scripts' children.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                OcrError::MissingDependency(format!(
                    "could not launch {}: {err}",
                    self.program.display()
                ))
            }
            _ => OcrError::Io(err),
        })?;

        wait_with_timeout(&mut child, timeout)
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<RunOutcome> {
    // Drain pipes while waiting so a chatty engine can't block on a full buffer.
    let stdout_thread = drain(child.stdout.take());
    let stderr_thread = drain(child.stderr.take());

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            let mut text = join_reader(stdout_thread)?;
            text.push_str(&join_reader(stderr_thread)?);
            return Ok(RunOutcome::Finished(EngineOutput { status, text }));
        }

        if start.elapsed() > timeout {
            warn!("tesseract process timed out after {:?}", timeout);
            kill_tree(child);
            child.wait()?;
            let _ = join_reader(stdout_thread);
            let _ = join_reader(stderr_thread);
            return Ok(RunOutcome::TimedOut);
        }

        std::thread::sleep(Duration::from_millis(20));
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // The child leads its own group; a negative pid signals every member.
    let pgid = child.id() as i32;
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut r) = reader {
            r.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_reader(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<String> {
    let bytes = handle
        .join()
        .map_err(|_| OcrError::Io(std::io::Error::other("pipe reader thread panicked")))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
