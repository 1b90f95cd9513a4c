//! Read-only informational resources addressed by URI.

pub mod catalog;
pub mod registry;

pub use registry::{Resource, ResourceBody, ResourceRegistry};
