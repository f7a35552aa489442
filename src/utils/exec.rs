//! External command execution.
//!
//! Provides a Builder-based API for running the external processing program
//! as a child process with bounded output capture, a timeout and
//! cooperative cancellation.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Capture stdout of a directory run
//! let stdout = Cmd::new("python")
//!     .arg(&script)
//!     .arg(&dir)
//!     .capture(true)
//!     .timeout(Duration::from_secs(300))
//!     .cancel_on(token.clone())
//!     .run()
//!     .await?;
//! ```

use std::{
    ffi::{OsStr, OsString},
    process::{ExitStatus, Stdio},
    sync::OnceLock,
    time::Duration,
};

use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::debug;

/// Default cap on captured stdout/stderr (10 MiB per stream).
pub const DEFAULT_MAX_OUTPUT: usize = 10 * 1024 * 1024;

// ============================================================================
// Errors
// ============================================================================

/// Failure modes of a single command execution.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{program}` failed with {status}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Command `{program}` timed out after {}s", .timeout.as_secs_f64())]
    Timeout { program: String, timeout: Duration },

    #[error("Command `{program}` was cancelled")]
    Cancelled { program: String },

    #[error("Command `{program}` exceeded the {limit} byte output limit")]
    OutputLimit { program: String, limit: usize },

    #[error("I/O error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecError {
    /// Captured stderr text, empty unless the process exited non-zero.
    pub fn stderr(&self) -> &str {
        match self {
            Self::Failed { stderr, .. } => stderr,
            _ => "",
        }
    }
}

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(String, String)>,
    capture: bool,
    max_output: usize,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            envs: Vec::new(),
            capture: false,
            max_output: DEFAULT_MAX_OUTPUT,
            timeout: None,
            cancel: None,
        }
    }

    /// Add a single argument.
    ///
    /// Arguments are handed to the OS as-is (no shell), so paths with
    /// spaces or quotes need no escaping.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Return captured stdout from `run` (otherwise an empty string).
    pub fn capture(mut self, enable: bool) -> Self {
        self.capture = enable;
        self
    }

    /// Cap the bytes read from each of stdout and stderr.
    pub fn max_output(mut self, bytes: usize) -> Self {
        self.max_output = bytes;
        self
    }

    /// Kill the process if it runs longer than `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kill the process when `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Command line for debug output.
    fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Execute the command and wait for it to exit.
    pub async fn run(self) -> Result<String, ExecError> {
        let name = self.program_name();
        debug!("exec"; "{}", self.command_line());

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().cloned())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: name.clone(),
            source,
        })?;

        enum Completion {
            Finished(Result<(ExitStatus, Vec<u8>, Vec<u8>), ExecError>),
            TimedOut(Duration),
            Cancelled,
        }

        let completion = tokio::select! {
            res = collect_output(&mut child, &name, self.max_output) => Completion::Finished(res),
            d = expire(self.timeout) => Completion::TimedOut(d),
            _ = cancelled(self.cancel.as_ref()) => Completion::Cancelled,
        };

        let (status, stdout, stderr) = match completion {
            Completion::Finished(Ok(output)) => output,
            Completion::Finished(Err(e)) => {
                kill(&mut child).await;
                return Err(e);
            }
            Completion::TimedOut(timeout) => {
                kill(&mut child).await;
                return Err(ExecError::Timeout {
                    program: name,
                    timeout,
                });
            }
            Completion::Cancelled => {
                kill(&mut child).await;
                return Err(ExecError::Cancelled { program: name });
            }
        };

        let stderr = String::from_utf8_lossy(&stderr);
        if !status.success() {
            return Err(ExecError::Failed {
                program: name,
                status,
                stderr: strip_ansi(stderr.trim()).into_owned(),
            });
        }

        let stderr = stderr.trim();
        if !stderr.is_empty() {
            debug!(&name; "{}", strip_ansi(stderr));
        }

        if self.capture {
            Ok(String::from_utf8_lossy(&stdout).into_owned())
        } else {
            Ok(String::new())
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Drain both pipes, then reap the child.
async fn collect_output(
    child: &mut Child,
    name: &str,
    limit: usize,
) -> Result<(ExitStatus, Vec<u8>, Vec<u8>), ExecError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout, stderr) = tokio::try_join!(
        read_limited(stdout, name, limit),
        read_limited(stderr, name, limit)
    )?;

    let status = child.wait().await.map_err(|source| ExecError::Io {
        program: name.to_string(),
        source,
    })?;

    Ok((status, stdout, stderr))
}

/// Read a stream to EOF, failing once more than `limit` bytes arrive.
async fn read_limited<R>(reader: Option<R>, name: &str, limit: usize) -> Result<Vec<u8>, ExecError>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };

    let mut buffer = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut buffer)
        .await
        .map_err(|source| ExecError::Io {
            program: name.to_string(),
            source,
        })?;

    if buffer.len() > limit {
        return Err(ExecError::OutputLimit {
            program: name.to_string(),
            limit,
        });
    }
    Ok(buffer)
}

/// Resolve after `timeout`, or never.
async fn expire(timeout: Option<Duration>) -> Duration {
    match timeout {
        Some(d) => {
            tokio::time::sleep(d).await;
            d
        }
        None => std::future::pending().await,
    }
}

/// Resolve when `token` is cancelled, or never.
async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Kill and reap; the process may already be gone.
async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!("exec"; "kill failed: {}", e);
    }
}

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

// ============================================================================
// Tests
// ============================================================================
