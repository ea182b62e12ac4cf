//! MCP (Model Context Protocol) server exposing Phabricator tools.
//!
//! Speaks JSON-RPC 2.0 over newline-delimited stdio and exposes the
//! Maniphest/Differential tool surface, including the review-feedback
//! correlation pipeline from `phab-review`.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use server::McpServer;
