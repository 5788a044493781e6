//! Child process execution.
//!
//! Every host mutation the installer performs goes through a
//! [`CommandRunner`], so components can be exercised against
//! [`MockRunner`](super::MockRunner) in tests.

use crate::error::{Result, SetupError};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Number of output lines kept when surfacing a failure.
pub const TAIL_LINES: usize = 20;

/// Result of executing a child process.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal or timed out).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// Whether the process was killed after exceeding its timeout.
    pub timed_out: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
            timed_out: false,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
            timed_out: false,
        }
    }

    /// Stdout followed by stderr.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }

    /// The last [`TAIL_LINES`] lines of combined output.
    pub fn output_tail(&self) -> String {
        tail_lines(&self.combined_output(), TAIL_LINES)
    }
}

/// Keep the last `n` lines of `text`.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Data written to the child's stdin, which is then closed.
    pub stdin: Option<String>,

    /// Kill the child after this long (None = wait for it to finish).
    pub timeout: Option<Duration>,
}

/// A program plus its arguments. Arguments are passed straight to the
/// process, never through a shell.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub options: CommandOptions,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.options.stdin = Some(input.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Shell-quoted rendering, used in logs and error messages.
    pub fn display(&self) -> String {
        shell_words::join(
            std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str)),
        )
    }
}

/// Capability interface over child process execution.
pub trait CommandRunner {
    /// Run the invocation to completion and capture its output.
    ///
    /// Returns `Err` only when the process could not be started; a non-zero
    /// exit is reported through [`CommandResult::success`].
    fn run(&self, invocation: &Invocation) -> Result<CommandResult>;
}

/// Run an invocation and turn a non-zero exit into [`SetupError::CommandFailed`].
pub fn run_checked(runner: &dyn CommandRunner, invocation: &Invocation) -> Result<CommandResult> {
    let result = runner.run(invocation)?;
    if result.success {
        Ok(result)
    } else {
        Err(SetupError::CommandFailed {
            command: invocation.display(),
            code: result.exit_code,
            output_tail: result.output_tail(),
        })
    }
}

/// Run an invocation and report only whether it exited 0.
pub fn run_succeeds(runner: &dyn CommandRunner, invocation: &Invocation) -> bool {
    runner.run(invocation).map(|r| r.success).unwrap_or(false)
}

/// Runs real processes on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        let start = Instant::now();
        tracing::debug!("exec: {}", invocation.display());

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);

        if let Some(cwd) = &invocation.options.cwd {
            cmd.current_dir(cwd);
        }

        for (key, value) in &invocation.options.env {
            cmd.env(key, value);
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        if invocation.options.stdin.is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }

        let mut child = cmd.spawn().map_err(|e| SetupError::CommandFailed {
            command: invocation.display(),
            code: None,
            output_tail: e.to_string(),
        })?;

        if let (Some(input), Some(mut pipe)) = (&invocation.options.stdin, child.stdin.take()) {
            // dropping the pipe closes it so the child sees EOF
            let _ = pipe.write_all(input.as_bytes());
        }

        let stdout_handle = child.stdout.take().map(|mut out| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = out.read_to_end(&mut buf);
                buf
            })
        });
        let stderr_handle = child.stderr.take().map(|mut err| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = err.read_to_end(&mut buf);
                buf
            })
        });

        let status = match invocation.options.timeout {
            None => Some(child.wait()?),
            Some(limit) => loop {
                if let Some(status) = child.try_wait()? {
                    break Some(status);
                }
                if start.elapsed() >= limit {
                    let _ = child.kill();
                    let _ = child.wait();
                    break None;
                }
                thread::sleep(Duration::from_millis(50));
            },
        };

        let collect = |handle: Option<thread::JoinHandle<Vec<u8>>>| {
            handle
                .and_then(|h| h.join().ok())
                .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
                .unwrap_or_default()
        };
        let stdout = collect(stdout_handle);
        let stderr = collect(stderr_handle);
        let duration = start.elapsed();

        match status {
            Some(status) if status.success() => Ok(CommandResult::success(stdout, stderr, duration)),
            Some(status) => Ok(CommandResult::failure(status.code(), stdout, stderr, duration)),
            None => {
                let mut result = CommandResult::failure(None, stdout, stderr, duration);
                result.timed_out = true;
                Ok(result)
            }
        }
    }
}
