//! Command execution utilities
//!
//! This module provides the [`CommandRunner`] seam through which tasks invoke
//! external tools, and [`ShellCommandRunner`], the implementation used by the
//! CLI. Output is streamed to the console while it is captured, and the child
//! process is killed when the run is cancelled.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::console::Console;
use crate::types::{ShipwrightError, ShipwrightResult};

/// Exit status and combined output of an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Capability to run an external command line
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(
        &self,
        command_line: &str,
        cancellation: &CancellationToken,
    ) -> ShipwrightResult<CommandOutput>;

    /// Command line as it may appear in output and errors
    fn redact(&self, command_line: &str) -> String {
        command_line.to_string()
    }

    /// Execute and treat a non-zero exit code as a failure
    async fn run_checked(
        &self,
        command_line: &str,
        cancellation: &CancellationToken,
    ) -> ShipwrightResult<CommandOutput> {
        let output = self.execute(command_line, cancellation).await?;
        if !output.success() {
            return Err(ShipwrightError::CommandFailed {
                command: self.redact(command_line),
                exit_code: output.exit_code,
            });
        }
        Ok(output)
    }
}

/// Runs command lines through the platform shell
pub struct ShellCommandRunner {
    working_dir: PathBuf,
    console: Console,
    redacted: Vec<String>,
}

impl ShellCommandRunner {
    pub fn new(working_dir: impl Into<PathBuf>, console: Console) -> Self {
        Self {
            working_dir: working_dir.into(),
            console,
            redacted: Vec::new(),
        }
    }

    /// Mask `secret` wherever a command line is echoed or logged
    pub fn with_redacted(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() && !self.redacted.contains(&secret) {
            self.redacted.push(secret);
        }
        self
    }

    fn shell_command(command_line: &str) -> Command {
        if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.arg("/C").arg(command_line);
            command
        } else {
            let mut command = Command::new("sh");
            command.arg("-c").arg(command_line);
            command
        }
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    fn redact(&self, command_line: &str) -> String {
        self.redacted
            .iter()
            .fold(command_line.to_string(), |line, secret| line.replace(secret.as_str(), "***"))
    }

    async fn execute(
        &self,
        command_line: &str,
        cancellation: &CancellationToken,
    ) -> ShipwrightResult<CommandOutput> {
        if cancellation.is_cancelled() {
            return Err(ShipwrightError::Cancelled {
                completed: Vec::new(),
            });
        }

        let shown = self.redact(command_line);
        self.console.command(&shown);

        let mut command = Self::shell_command(command_line);
        command
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        debug!(command = %shown, pid = ?child.id(), "spawned command");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let console = self.console;

        let run = async {
            let (out, err, status) = tokio::join!(
                pump(stdout, console, false),
                pump(stderr, console, true),
                child.wait()
            );
            let mut output = out?;
            output.push_str(&err?);
            Ok::<_, ShipwrightError>((status?, output))
        };

        let (status, output) = tokio::select! {
            _ = cancellation.cancelled() => {
                debug!(command = %shown, "cancelled, killing command");
                return Err(ShipwrightError::Cancelled { completed: Vec::new() });
            }
            result = run => result?,
        };

        self.console.blank_line();

        let exit_code = status.code().unwrap_or(-1);
        debug!(command = %shown, exit_code, "command finished");
        Ok(CommandOutput { exit_code, output })
    }
}

async fn pump<R>(reader: Option<R>, console: Console, is_stderr: bool) -> ShipwrightResult<String>
where
    R: AsyncRead + Unpin,
{
    let mut captured = String::new();
    let Some(reader) = reader else {
        return Ok(captured);
    };

    // Tools are free to print bytes that are not UTF-8
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            break;
        }
        let raw = buffer.strip_suffix(b"\n").unwrap_or(&buffer[..]);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        console.output_line(&line, is_stderr);
        captured.push_str(&line);
        captured.push('\n');
    }
    Ok(captured)
}
