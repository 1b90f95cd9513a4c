//! Core types & traits: protocol envelope, error taxonomy and the tool contract.

pub mod error;
pub mod mcp;
pub mod tool;
