//! External command execution.
//!
//! The publisher drives `docker` and `git` through the [`CommandExecutor`]
//! abstraction so their invocations can be scripted in tests.

use crate::error::{PublisherError, Result};
use std::io::Read;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default timeout for git operations (5 minutes).
pub const GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the
    /// command, or [`PublisherError::CommandTimedOut`] when the executor
    /// enforces a deadline that the command exceeds.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use release_image_publisher::process::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("docker", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), release_image_publisher::error::PublisherError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system and waits for them to finish.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(PublisherError::from)
    }
}

/// Executes commands on the host system, killing any that outlive the
/// configured timeout.
#[derive(Debug, Clone, Copy)]
pub struct TimedCommandExecutor {
    timeout: Duration,
}

impl TimedCommandExecutor {
    /// Create an executor that allows each command `timeout` to finish.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TimedCommandExecutor {
    fn default() -> Self {
        Self::new(GIT_TIMEOUT)
    }
}

impl CommandExecutor for TimedCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes while waiting so a chatty child cannot block on a
        // full pipe buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        match child.wait_timeout(self.timeout)? {
            Some(status) => Ok(Output {
                status,
                stdout: join_drain(stdout)?,
                stderr: join_drain(stderr)?,
            }),
            None => {
                kill_quietly(&mut child);
                Err(PublisherError::CommandTimedOut {
                    command: render_command(cmd, args),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

type DrainHandle = Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> DrainHandle {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            reader.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

fn join_drain(handle: DrainHandle) -> Result<Vec<u8>> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    match handle.join() {
        Ok(bytes) => Ok(bytes?),
        Err(_) => Err(PublisherError::Io(std::io::Error::other(
            "output reader thread panicked",
        ))),
    }
}

fn kill_quietly(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Render a command line for diagnostics.
#[must_use]
pub fn render_command(cmd: &str, args: &[&str]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert an unsuccessful exit into [`PublisherError::CommandFailed`].
///
/// # Errors
///
/// Returns [`PublisherError::CommandFailed`] carrying the trimmed standard
/// error when `output` reports a non-zero exit.
pub fn ensure_success(cmd: &str, args: &[&str], output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(PublisherError::CommandFailed {
        command: render_command(cmd, args),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
    })
}
