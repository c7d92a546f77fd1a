use std::error::Error as StdError;

/// Maximum number of entries carried in an error's trace excerpt.
const MAX_TRACE_ENTRIES: usize = 8;

/// Errors raised while dispatching a tool call.
///
/// Every variant is caught at the per-request boundary in the server loop and
/// turned into a JSON-RPC error response; none of them stop the loop.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Remote command failed with exit status {status}: {stderr}")]
    RemoteExecution { status: i32, stderr: String },

    #[error("Transport error: {context}")]
    Transport {
        context: String,
        #[source]
        source: Option<TransportSource>,
    },

    #[error("Remote task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Underlying cause of a [`BridgeError::Transport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportSource {
    #[error(transparent)]
    Ssh(#[from] ssh2::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn transport(context: impl Into<String>) -> Self {
        Self::Transport {
            context: context.into(),
            source: None,
        }
    }

    pub fn transport_with(context: impl Into<String>, source: impl Into<TransportSource>) -> Self {
        Self::Transport {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    /// Short trace excerpt: this error's message followed by its source chain.
    pub fn trace(&self) -> Vec<String> {
        let mut lines = vec![self.to_string()];
        let mut current = self.source();
        while let Some(err) = current {
            if lines.len() >= MAX_TRACE_ENTRIES {
                break;
            }
            lines.push(err.to_string());
            current = err.source();
        }
        lines
    }
}
