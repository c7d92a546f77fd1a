//! MCP server exposing Rails administration tools.
//!
//! Each `tools/call` is turned into exactly one shell command, run on the
//! application host over a fresh SSH session, and answered with the
//! command's output. Requests arrive as newline-delimited JSON-RPC 2.0 on
//! stdin and are answered in order on stdout.

pub mod adapters;
pub mod command;
pub mod config;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod transport;

pub mod schema;
