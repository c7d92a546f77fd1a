//! Tool registry.
//!
//! An adapter bundles related tools. The registry holds the core adapter
//! followed by any optional adapters named in configuration, and resolves a
//! tool call by asking each adapter in order; the first one that claims the
//! name handles it.

pub mod journal;
pub mod rails;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::error::BridgeError;
use crate::protocol::ToolResultContent;
use crate::transport::Executor;

pub use journal::JournalAdapter;
pub use rails::RailsAdapter;

/// Static description of one tool, as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Outcome of offering a tool call to one adapter.
pub type Dispatch = Option<Result<Vec<ToolResultContent>, BridgeError>>;

/// The closed set of adapters this server knows about.
#[derive(Debug, Clone)]
pub enum Adapter {
    Rails(RailsAdapter),
    Journal(JournalAdapter),
}

impl Adapter {
    /// Build an optional adapter by its configured name.
    pub fn optional(name: &str, config: &ServerConfig) -> Option<Self> {
        match name {
            journal::ADAPTER_NAME => Some(Self::Journal(JournalAdapter::new(config.journal_max_lines))),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rails(_) => rails::ADAPTER_NAME,
            Self::Journal(_) => journal::ADAPTER_NAME,
        }
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        match self {
            Self::Rails(a) => a.descriptors(),
            Self::Journal(a) => a.descriptors(),
        }
    }

    /// `None` means the adapter does not own `tool`.
    pub async fn dispatch(&self, tool: &str, args: &Value, executor: &Executor) -> Dispatch {
        match self {
            Self::Rails(a) => a.dispatch(tool, args, executor).await,
            Self::Journal(a) => a.dispatch(tool, args, executor).await,
        }
    }
}

/// Ordered, immutable adapter set plus the executor every tool runs through.
pub struct Registry {
    adapters: Vec<Adapter>,
    executor: Executor,
}

impl Registry {
    /// Core adapter first, then each recognised optional adapter in listed
    /// order. Unknown names are skipped with a warning.
    pub fn from_config(config: &ServerConfig, executor: Executor) -> Self {
        let mut adapters = vec![Adapter::Rails(RailsAdapter::new(config.rails.clone()))];

        for name in &config.adapters {
            if adapters.iter().any(|a| a.name() == name.as_str()) {
                debug!(adapter = %name, "adapter already active");
                continue;
            }
            match Adapter::optional(name, config) {
                Some(adapter) => adapters.push(adapter),
                None => warn!(adapter = %name, "ignoring unknown adapter"),
            }
        }

        Self::new(adapters, executor)
    }

    pub fn new(adapters: Vec<Adapter>, executor: Executor) -> Self {
        Self { adapters, executor }
    }

    pub fn adapter_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(Adapter::name).collect()
    }

    /// Every active adapter's descriptors, in activation order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.adapters.iter().flat_map(Adapter::descriptors).collect()
    }

    pub async fn call(&self, tool: &str, args: &Value) -> Result<Vec<ToolResultContent>, BridgeError> {
        for adapter in &self.adapters {
            if let Some(outcome) = adapter.dispatch(tool, args, &self.executor).await {
                return outcome;
            }
        }
        Err(BridgeError::UnknownTool(tool.to_string()))
    }
}
