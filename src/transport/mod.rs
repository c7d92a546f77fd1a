//! Remote command execution.
//!
//! A [`CommandRunner`] runs exactly one command per call on a fresh session
//! and blocks until the remote side reports completion. [`Executor`] moves
//! that blocking call onto the runtime's blocking pool.

pub mod ssh;

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::error::BridgeError;

pub use ssh::SshRunner;

/// Captured output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteCommandResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the remote side never reported an exit status.
    pub exit_status: Option<i32>,
    /// Set when the remote process was terminated by a signal.
    pub exit_signal: Option<String>,
}

impl RemoteCommandResult {
    pub fn exited(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_status: Some(status),
            exit_signal: None,
        }
    }

    /// Return stdout when the command exited with status 0.
    ///
    /// A non-zero status becomes [`BridgeError::RemoteExecution`] carrying
    /// stderr; a missing status becomes [`BridgeError::Transport`].
    pub fn into_stdout(self) -> Result<String, BridgeError> {
        match self.exit_status {
            Some(0) => Ok(self.stdout),
            Some(status) => Err(BridgeError::RemoteExecution {
                status,
                stderr: self.stderr.trim_end().to_string(),
            }),
            None => Err(BridgeError::transport(match self.exit_signal {
                Some(signal) => format!("remote command terminated by signal {signal}"),
                None => "remote command closed without reporting an exit status".to_string(),
            })),
        }
    }
}

/// Blocking transport contract: one session, one command, full capture.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str) -> Result<RemoteCommandResult, BridgeError>;
}

/// Async front for a [`CommandRunner`], shared read-only by every dispatch.
#[derive(Clone)]
pub struct Executor {
    runner: Arc<dyn CommandRunner>,
}

impl Executor {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn execute(&self, command: String) -> Result<RemoteCommandResult, BridgeError> {
        let runner = Arc::clone(&self.runner);
        let started = Instant::now();
        let result = tokio::task::spawn_blocking(move || runner.run(&command)).await??;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            exit_status = ?result.exit_status,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "remote command finished"
        );
        Ok(result)
    }
}

/// Byte buffer with an upper bound; overflow is dropped and flagged.
#[derive(Debug)]
pub struct Capture {
    bytes: Vec<u8>,
    limit: usize,
    dropped: usize,
}

impl Capture {
    pub fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            dropped: 0,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.bytes.len());
        let take = room.min(chunk.len());
        self.bytes.extend_from_slice(&chunk[..take]);
        self.dropped += chunk.len() - take;
    }

    pub fn truncated(&self) -> bool {
        self.dropped > 0
    }

    pub fn into_string(self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.dropped > 0 {
            if !text.ends_with('\n') && !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&format!("[output truncated: {} bytes dropped]", self.dropped));
        }
        text
    }
}
