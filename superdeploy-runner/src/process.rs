//! Subprocess seam.
//!
//! Everything the dispatcher executes goes through [`ProcessRunner`]: a
//! program, its arguments and a working directory in, an exit code and the
//! captured output back. [`SystemRunner`] is the real implementation;
//! [`crate::fake::FakeRunner`] records invocations for tests.

use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::error::RunnerError;

/// A command to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `program arg1 arg2 …`, for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Result of a completed subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was terminated by a signal.
    pub code: i32,
    /// Captured copy of what was already streamed to the terminal. Part of the
    /// seam contract for other `ProcessRunner` callers; the dispatcher does not read it.
    pub stdout: String,
    /// Captured stderr; the tail goes into the failure log record.
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Last `lines` non-empty lines of stderr, for failure reports.
    pub fn stderr_tail(&self, lines: usize) -> String {
        let kept: Vec<&str> = self
            .stderr
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        kept[kept.len().saturating_sub(lines)..].join("\n")
    }
}

pub trait ProcessRunner {
    /// Run `invocation` to completion. Blocks without timeout.
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunnerError>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunnerError> {
        (**self).run(invocation)
    }
}

/// Runs real processes, streaming their output line by line to the terminal
/// and to the log at debug level while capturing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunnerError> {
        tracing::debug!(command = %invocation, cwd = %invocation.cwd.display(), "spawning");

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let stderr_reader = child
            .stderr
            .take()
            .map(|pipe| std::thread::spawn(move || pump(pipe, Stream::Stderr, true)));
        let stdout = child
            .stdout
            .take()
            .map(|pipe| pump(pipe, Stream::Stdout, true))
            .unwrap_or_default();
        let stderr = stderr_reader
            .map(|handle| handle.join().unwrap_or_default())
            .unwrap_or_default();

        let status = child.wait().map_err(|source| RunnerError::Wait {
            program: invocation.program.clone(),
            source,
        })?;

        Ok(ProcessOutput {
            code: status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Copy `pipe` line by line into a `String`, echoing and logging each line.
/// Invalid UTF-8 is replaced rather than aborting the read.
fn pump(pipe: impl Read, stream: Stream, echo: bool) -> String {
    let mut reader = BufReader::new(pipe);
    let mut captured = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "failed reading subprocess output");
                break;
            }
        }
        let line = String::from_utf8_lossy(&buf);
        let trimmed = line.trim_end_matches(['\n', '\r']);
        match stream {
            Stream::Stdout => {
                tracing::debug!(target: "superdeploy::subprocess", stream = "stdout", "{trimmed}");
                if echo {
                    let mut out = std::io::stdout().lock();
                    let _ = writeln!(out, "{trimmed}");
                }
            }
            Stream::Stderr => {
                tracing::debug!(target: "superdeploy::subprocess", stream = "stderr", "{trimmed}");
                if echo {
                    let mut err = std::io::stderr().lock();
                    let _ = writeln!(err, "{trimmed}");
                }
            }
        }
        captured.push_str(trimmed);
        captured.push('\n');
    }
    captured
}
