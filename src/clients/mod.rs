pub mod earth2;

pub use earth2::{DownstreamError, Earth2Client, ForecastBackend};
