//! Non-blocking spawn/poll/terminate wrapper around the external tool.

use crate::invocation::ToolInvocation;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Bound on draining the output pipes during termination; a
/// grandchild inheriting the pipe ends could otherwise hold them open
/// indefinitely.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Captured output of a terminated process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,

    /// Set only when the process could not be started at all
    pub spawn_error: Option<String>,

    /// Exit code; `None` if the process was killed or never started
    pub exit_status: Option<i32>,
}

/// Non-blocking surface the poll scheduler drives a process through.
#[async_trait]
pub trait PollableProcess: Send {
    /// True once the process has exited or failed to start. Callable
    /// arbitrarily often; performs no work beyond a liveness check.
    fn poll(&mut self) -> bool;

    /// Force-end the process if still running and return the buffered
    /// output. A second call returns the same output without
    /// re-running termination.
    async fn terminate(&mut self) -> ProcessOutput;
}

/// Live reference to a spawned external process.
pub struct ProcessHandle {
    child: Option<Child>,
    stdout_reader: Option<JoinHandle<Vec<u8>>>,
    stderr_reader: Option<JoinHandle<Vec<u8>>>,
    spawn_error: Option<String>,
    terminated: Option<ProcessOutput>,
}

/// Spawns the external tool without blocking the caller.
pub struct ToolRunner;

impl ToolRunner {
    /// Spawn the tool for `invocation` and return its handle.
    ///
    /// The caller regains control immediately. A command that cannot
    /// be started still yields a handle: `poll` reports completion at
    /// once and `terminate` carries the spawn error.
    pub fn spawn(invocation: &ToolInvocation) -> ProcessHandle {
        let mut command = Command::new(&invocation.command);
        command
            .args(&invocation.args)
            .args(&invocation.targets)
            .current_dir(&invocation.working_dir)
            .envs(&invocation.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match command.spawn() {
            Ok(mut child) => {
                // Drain the pipes eagerly so the tool never blocks on a
                // full pipe buffer while we poll it.
                let stdout_reader = child.stdout.take().map(drain);
                let stderr_reader = child.stderr.take().map(drain);
                ProcessHandle {
                    child: Some(child),
                    stdout_reader,
                    stderr_reader,
                    spawn_error: None,
                    terminated: None,
                }
            }
            Err(err) => ProcessHandle {
                child: None,
                stdout_reader: None,
                stderr_reader: None,
                spawn_error: Some(err.to_string()),
                terminated: None,
            },
        }
    }
}

fn drain<R>(mut stream: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        let _ = stream.read_to_end(&mut buffer).await;
        buffer
    })
}

#[async_trait]
impl PollableProcess for ProcessHandle {
    fn poll(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(Some(_)) => true,
                Ok(None) => false,
                Err(_) => true,
            },
            // Failed to start, or already terminated.
            None => true,
        }
    }

    async fn terminate(&mut self) -> ProcessOutput {
        if let Some(output) = &self.terminated {
            return output.clone();
        }

        let mut output = ProcessOutput {
            spawn_error: self.spawn_error.clone(),
            ..Default::default()
        };

        if let Some(mut child) = self.child.take() {
            if !matches!(child.try_wait(), Ok(Some(_))) {
                let _ = child.start_kill();
            }
            if let Ok(status) = child.wait().await {
                output.exit_status = status.code();
            }
        }

        if let Some(reader) = self.stdout_reader.take() {
            if let Ok(Ok(buffer)) = timeout(DRAIN_TIMEOUT, reader).await {
                output.stdout = String::from_utf8_lossy(&buffer).into_owned();
            }
        }
        if let Some(reader) = self.stderr_reader.take() {
            if let Ok(Ok(buffer)) = timeout(DRAIN_TIMEOUT, reader).await {
                output.stderr = String::from_utf8_lossy(&buffer).into_owned();
            }
        }

        self.terminated = Some(output.clone());
        output
    }
}
