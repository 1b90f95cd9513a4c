//! Earth-2 MCP gateway: JSON-RPC 2.0 tool and resource calls over HTTP and
//! WebSocket, proxied to a downstream forecast service.

pub mod api;
pub mod cli;
pub mod clients;
pub mod core;
pub mod domain;
pub mod infra;
pub mod resources;
pub mod tools;
