use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::{EngineError, Interval};

/// Source of the generation mix intervals.
#[async_trait]
pub trait IntervalFetcher: Send + Sync {
    /// Fetch the intervals covering `from..to`, ordered by their start time.
    async fn fetch_intervals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Interval>, EngineError>;
}
