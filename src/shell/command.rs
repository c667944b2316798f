//! External command execution.
//!
//! Commands are spawned directly (no shell) from a [`CommandSpec`]. Output
//! lines are delivered to a callback as they are produced, and the call
//! returns only after the child has exited and both pipes are drained.

use crate::error::{ProvisionError, Result};
use std::fmt;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// A command to run: program, arguments, working directory and extra env.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Arguments, passed verbatim.
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: Option<PathBuf>,
    /// Environment variables merged over the inherited environment.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Start a spec for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Set the working directory.
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Wrap this command with `sudo`, keeping cwd and env.
    pub fn with_sudo(self) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: "sudo".to_string(),
            args,
            cwd: self.cwd,
            env: self.env,
        }
    }

    /// Program followed by its arguments.
    pub fn parts(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts().join(" "))
    }
}

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: Option<i32>, duration: Duration) -> Self {
        Self {
            exit_code,
            duration,
            success: false,
        }
    }
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl OutputLine {
    /// Line text regardless of stream.
    pub fn text(&self) -> &str {
        match self {
            Self::Stdout(s) | Self::Stderr(s) => s,
        }
    }
}

/// Runs external commands.
///
/// `Err` means the command could not be started at all; a command that ran
/// and exited non-zero is reported through [`CommandResult::success`].
pub trait CommandRunner: Send + Sync {
    /// Run to completion, delivering each output line to `on_line` as it
    /// is produced.
    fn run(
        &self,
        spec: &CommandSpec,
        on_line: &mut dyn FnMut(OutputLine),
    ) -> Result<CommandResult>;

    /// Run to completion, discarding output.
    fn run_quiet(&self, spec: &CommandSpec) -> Result<CommandResult> {
        self.run(spec, &mut |_| {})
    }
}

/// [`CommandRunner`] backed by real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        spec: &CommandSpec,
        on_line: &mut dyn FnMut(OutputLine),
    ) -> Result<CommandResult> {
        let start = Instant::now();
        tracing::debug!("Spawning: {}", spec);

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);

        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let spawn_failed = |source: std::io::Error| {
            tracing::debug!("Failed to spawn {}: {}", spec.program, source);
            ProvisionError::CommandSpawnFailed {
                command: spec.to_string(),
                source,
            }
        };

        let mut child = cmd.spawn().map_err(spawn_failed)?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(spawn_failed(std::io::Error::other("output pipes unavailable")));
        };

        let (tx, rx) = mpsc::channel();
        let tx_stdout = tx.clone();
        let tx_stderr = tx;

        // Spawn threads to read stdout and stderr
        let stdout_handle =
            thread::spawn(move || forward_lines(stdout, OutputLine::Stdout, &tx_stdout));
        let stderr_handle =
            thread::spawn(move || forward_lines(stderr, OutputLine::Stderr, &tx_stderr));

        // Ends once both readers have hit EOF and dropped their senders
        for line in rx {
            on_line(line);
        }

        let _ = stdout_handle.join();
        let _ = stderr_handle.join();

        let status = child.wait().map_err(spawn_failed)?;
        let duration = start.elapsed();

        if status.success() {
            Ok(CommandResult::success(duration))
        } else {
            Ok(CommandResult::failure(status.code(), duration))
        }
    }
}

/// Send every line of `reader` until EOF.
///
/// Bytes that are not valid UTF-8 are replaced rather than ending the read,
/// so the child never loses its pipe mid-build.
fn forward_lines<R: Read>(
    reader: R,
    wrap: fn(String) -> OutputLine,
    tx: &mpsc::Sender<OutputLine>,
) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\n', '\r']).to_string();
                let _ = tx.send(wrap(line));
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("Stopped reading command output: {}", e);
                break;
            }
        }
    }
}
