pub mod aggregator;
pub mod clock;
pub mod percentiles;
pub mod stream;
pub mod window;

pub use aggregator::{HealthStatus, MetricsAggregator, MetricsSnapshot};
pub use clock::{Clock, ManualClock, SystemClock};
