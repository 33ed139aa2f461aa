//! Runs slot commands in the platform shell off the interactive loop
//!
//! Every trigger gets its own tokio task and its own output buffers; there is
//! no queue and no per-slot exclusion, so pressing a button twice runs the
//! command twice concurrently. Completion is reported back to the interactive
//! loop as a [`PanelEvent`].

use std::io;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::resolver::CommandResolver;
use crate::config::ShellConfig;
use crate::input::PanelEvent;
use crate::LINE_ENDING;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Errors starting or talking to the shell process
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read command output: {0}")]
    Output(#[source] io::Error),
    #[error("failed to wait for command: {0}")]
    Wait(#[source] io::Error),
}

/// What a finished command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Only standard output (trailing line breaks removed)
    Output(String),
    /// Anything at all on standard error; standard output is discarded
    Error(String),
    /// Neither stream produced anything
    Silent,
}

impl ExecutionOutcome {
    /// Pick the outcome from the two captured streams
    pub fn from_streams(stdout: &str, stderr: &str) -> Self {
        if !stderr.is_empty() {
            Self::Error(trim_line_endings(stderr).to_string())
        } else if !stdout.is_empty() {
            Self::Output(trim_line_endings(stdout).to_string())
        } else {
            Self::Silent
        }
    }

    /// Text shown to the user, if any
    pub fn report(&self) -> Option<String> {
        match self {
            Self::Output(text) => Some(text.clone()),
            Self::Error(text) => Some(format!("Error: {}", text)),
            Self::Silent => None,
        }
    }
}

fn trim_line_endings(text: &str) -> &str {
    text.trim_end_matches(['\r', '\n'])
}

/// Shell program plus the flag that makes it run one inline command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    pub program: String,
    pub flag: String,
}

impl Shell {
    pub fn new(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }

    #[cfg(windows)]
    pub fn platform_default() -> Self {
        Self::new("cmd.exe", "/C")
    }

    #[cfg(not(windows))]
    pub fn platform_default() -> Self {
        Self::new("sh", "-c")
    }

    /// Platform default with any overrides from the config applied
    pub fn from_config(config: &ShellConfig) -> Self {
        let default = Self::platform_default();
        Self {
            program: config.program.clone().unwrap_or(default.program),
            flag: config.flag.clone().unwrap_or(default.flag),
        }
    }

    #[cfg(windows)]
    fn command(&self, resolved: &str) -> Command {
        let mut command = Command::new(&self.program);
        // cmd.exe does its own parsing; quoting by the std rules would mangle
        // the quoted executable paths produced by the resolver
        command.raw_arg(format!("{} {}", self.flag, resolved));
        command.creation_flags(CREATE_NO_WINDOW);
        command
    }

    #[cfg(not(windows))]
    fn command(&self, resolved: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.arg(&self.flag).arg(resolved);
        command
    }
}

struct RunnerInner {
    shell: Shell,
    resolver: CommandResolver,
    report_tx: UnboundedSender<PanelEvent>,
}

/// Spawns one task per triggered slot
#[derive(Clone)]
pub struct CommandRunner {
    inner: Arc<RunnerInner>,
}

impl CommandRunner {
    pub fn new(
        shell: Shell,
        resolver: CommandResolver,
        report_tx: UnboundedSender<PanelEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                shell,
                resolver,
                report_tx,
            }),
        }
    }

    pub fn resolver(&self) -> &CommandResolver {
        &self.inner.resolver
    }

    /// Resolve and run `command` for `slot` in the background
    ///
    /// Must be called from within the tokio runtime. The result arrives on the
    /// report channel as `CommandFinished` or `CommandFailed`.
    pub fn submit(&self, command: String, slot: usize) {
        let runner = self.clone();
        tokio::spawn(async move {
            let resolved = runner.inner.resolver.resolve(&command);
            info!("Running slot {}: {}", slot + 1, resolved);

            let event = match runner.execute(&resolved).await {
                Ok(outcome) => {
                    debug!("Slot {} finished: {:?}", slot + 1, outcome);
                    PanelEvent::CommandFinished { slot, outcome }
                }
                Err(e) => {
                    warn!("Slot {} failed: {}", slot + 1, e);
                    PanelEvent::CommandFailed {
                        slot,
                        message: e.to_string(),
                    }
                }
            };

            if runner.inner.report_tx.send(event).is_err() {
                debug!("Panel closed before slot {} finished", slot + 1);
            }
        });
    }

    /// Run an already-resolved command to completion and classify its output
    pub async fn execute(&self, resolved: &str) -> Result<ExecutionOutcome, RunError> {
        let shell = &self.inner.shell;
        let mut command = shell.command(resolved);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            program: shell.program.clone(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout, stderr) =
            match tokio::try_join!(collect_lines(stdout), collect_lines(stderr)) {
                Ok(streams) => streams,
                Err(e) => {
                    abandon(&mut child).await;
                    return Err(RunError::Output(e));
                }
            };

        let status = child.wait().await.map_err(RunError::Wait)?;
        debug!("Shell exited with {}", status);

        Ok(ExecutionOutcome::from_streams(&stdout, &stderr))
    }
}

/// Kill a shell whose output can no longer be read and reap it
async fn abandon(child: &mut Child) {
    match child.kill().await {
        Ok(()) => debug!("Killed shell after an output error"),
        Err(e) => warn!("Failed to kill shell: {}", e),
    }
}

/// Read a stream to the end, one line at a time, re-terminating every line
/// with the platform line ending
async fn collect_lines<R: AsyncRead + Unpin>(stream: Option<R>) -> io::Result<String> {
    let Some(stream) = stream else {
        return Ok(String::new());
    };

    let mut reader = BufReader::new(stream);
    let mut collected = String::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        collected.push_str(trim_line_endings(&text));
        collected.push_str(LINE_ENDING);
    }
    Ok(collected)
}
