//! Expose n8n workflow operations as MCP tools.
//!
//! The crate is a thin translation layer: each tool call becomes exactly one HTTP request to the
//! n8n REST API, and the response is handed back as a text content block.
//!
//! - `config`: base URL and auth headers, resolved from the environment on every call
//! - `client`: the HTTP round trip and response normalization
//! - `tools`: the tool catalog and handlers
//! - `server`: the stdio MCP server

pub mod client;
pub mod config;
pub mod error;
pub mod semantics;
pub mod server;
pub mod tools;
pub mod validation;

pub use client::{HealthReport, N8nClient};
pub use config::EnvSource;
pub use error::{N8nError, Result};
pub use server::N8nMcpServer;
pub use tools::ToolRegistry;
