//! External command execution.
//!
//! The setup shells out for two things: probing `git --version` and the
//! `gh secret set` fallback. Both go through [`ToolRunner`] so the
//! orchestrator can be driven by a scripted runner in tests.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// One command to run.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub program: &'a str,
    pub args: Vec<&'a str>,
    /// Extra environment for the child.
    pub envs: Vec<(&'a str, &'a str)>,
    /// Written to the child's stdin, which is then closed.
    pub stdin: Option<&'a str>,
    pub timeout: Duration,
}

impl<'a> Invocation<'a> {
    pub fn new(program: &'a str, args: &[&'a str], timeout: Duration) -> Self {
        Self {
            program,
            args: args.to_vec(),
            envs: Vec::new(),
            stdin: None,
            timeout,
        }
    }

    pub fn env(mut self, key: &'a str, value: &'a str) -> Self {
        self.envs.push((key, value));
        self
    }

    pub fn stdin(mut self, input: &'a str) -> Self {
        self.stdin = Some(input);
        self
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands.
pub trait ToolRunner {
    /// Run to completion or until the invocation's timeout.
    ///
    /// # Errors
    ///
    /// `NotFound` when the program is not on `PATH`, `TimedOut` when the
    /// deadline passes, or any spawn/IO error.
    fn run(&self, invocation: &Invocation<'_>) -> std::io::Result<ToolOutput>;
}

/// Runs commands as child processes of this one.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Read a child pipe to the end on its own thread so the child never
/// blocks on a full pipe while we poll for exit.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut raw = Vec::new();
        pipe.read_to_end(&mut raw)?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    })
}

fn collect(reader: Option<JoinHandle<std::io::Result<String>>>) -> std::io::Result<String> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| std::io::Error::other("output reader panicked"))?,
        None => Ok(String::new()),
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation<'_>) -> std::io::Result<ToolOutput> {
        let program = which::which(invocation.program).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found on PATH: {}", invocation.program, e),
            )
        })?;
        trace!(program = %program.display(), args = ?invocation.args, "spawning");

        let mut child = Command::new(&program)
            .args(&invocation.args)
            .envs(invocation.envs.iter().copied())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout_reader = child.stdout.take().map(drain);
        let stderr_reader = child.stderr.take().map(drain);

        if let (Some(input), Some(mut stdin)) = (invocation.stdin, child.stdin.take()) {
            stdin.write_all(input.as_bytes())?;
        }

        let deadline = Instant::now() + invocation.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                debug!(program = invocation.program, "command timed out");
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!(
                        "{} did not finish within {}s",
                        invocation.program,
                        invocation.timeout.as_secs()
                    ),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = collect(stdout_reader)?;
        let stderr = collect(stderr_reader)?;

        debug!(
            program = invocation.program,
            success = status.success(),
            "command finished"
        );
        Ok(ToolOutput {
            success: status.success(),
            stdout,
            stderr,
        })
    }
}
