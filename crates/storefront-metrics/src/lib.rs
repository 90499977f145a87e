mod metrics;

pub use metrics::{toggle_outcome, StorefrontMetrics};
