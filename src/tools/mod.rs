pub mod forecast;
pub mod registry;

pub use registry::ToolRegistry;
