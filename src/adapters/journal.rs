use serde_json::{json, Value};
use tracing::debug;

use crate::command::JournalQuery;
use crate::error::BridgeError;
use crate::protocol::ToolResultContent;
use crate::transport::Executor;

use super::{Dispatch, ToolDescriptor};

pub const ADAPTER_NAME: &str = "journalctl";

pub const JOURNALCTL_TAIL: &str = "journalctl_tail";

/// Returned when journalctl succeeds but prints nothing.
pub const NO_ENTRIES: &str = "No journal entries matched the given filters.";

/// Optional log-tail tools, enabled with `MCP_ADAPTERS=journalctl`.
#[derive(Debug, Clone)]
pub struct JournalAdapter {
    max_lines: u32,
}

impl JournalAdapter {
    pub fn new(max_lines: u32) -> Self {
        Self { max_lines }
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        vec![ToolDescriptor {
            name: JOURNALCTL_TAIL,
            description: "Tail the systemd journal on the remote host",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "unit": {
                        "type": "string",
                        "description": "systemd unit to filter on (journalctl -u)"
                    },
                    "lines": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": self.max_lines,
                        "description": "Number of lines to return"
                    },
                    "since": {
                        "type": "string",
                        "description": "Start time, e.g. \"1 hour ago\" (journalctl --since)"
                    },
                    "priority": {
                        "type": "string",
                        "description": "Priority or range, e.g. \"err\" or \"warning..emerg\" (journalctl -p)"
                    },
                    "grep": {
                        "type": "string",
                        "description": "Pattern to match messages against (journalctl -g)"
                    },
                    "reverse": {
                        "type": "boolean",
                        "description": "Newest entries first"
                    }
                }
            }),
        }]
    }

    pub async fn dispatch(&self, tool: &str, args: &Value, executor: &Executor) -> Dispatch {
        if tool != JOURNALCTL_TAIL {
            return None;
        }

        Some(self.tail(args, executor).await)
    }

    async fn tail(&self, args: &Value, executor: &Executor) -> Result<Vec<ToolResultContent>, BridgeError> {
        let query = JournalQuery::from_arguments(args, self.max_lines);
        debug!(?query, "journal query");

        let stdout = executor.execute(query.to_command()).await?.into_stdout()?;
        let text = if stdout.trim().is_empty() {
            NO_ENTRIES.to_string()
        } else {
            stdout
        };
        Ok(vec![ToolResultContent::text(text)])
    }
}
