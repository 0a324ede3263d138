//! MCP (Model Context Protocol) Server Implementation
//!
//! A JSON-RPC 2.0 server speaking the subset of MCP needed to expose tools:
//! `initialize`, `tools/list`, `tools/call`, `ping` and the lifecycle
//! notifications.


pub mod errors;
pub mod protocol;
pub mod server;
pub mod validation;

pub use errors::{ErrorHandler, McpError};
pub use server::{ConnectionState, McpServer, MessageHandler, ToolHandler};
