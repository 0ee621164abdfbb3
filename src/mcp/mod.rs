//! MCP (Model Context Protocol) server support
//!
//! Exposes the Sensr tool registry to an MCP host over newline-delimited
//! JSON-RPC 2.0 on stdin/stdout.
//!
//! # Module Layout
//!
//! - `types`  -- JSON-RPC primitives and the MCP tool/initialize types
//! - `server` -- request dispatch and the concurrent stdio loop

pub mod server;
pub mod types;

pub use server::{serve_stdio, McpServer};
