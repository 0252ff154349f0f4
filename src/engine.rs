use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

use crate::{
    api::IntervalFetcher,
    core::{ChargingWindow, DailySummary, EngineError, Interval, WindowSearch, summarize_daily},
    prelude::*,
};

/// Fetches the generation mix and aggregates it for the callers.
pub struct Engine {
    fetcher: Box<dyn IntervalFetcher>,
}

impl Engine {
    pub fn new(fetcher: impl IntervalFetcher + 'static) -> Self {
        Self { fetcher: Box::new(fetcher) }
    }

    /// Summarize each UTC date from today's midnight up to `days_ahead` days later.
    #[instrument(skip_all, fields(days_ahead = days_ahead))]
    pub async fn compute_multi_day_summary(
        &self,
        now: DateTime<Utc>,
        days_ahead: u16,
    ) -> Result<Vec<DailySummary>, EngineError> {
        let since = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let intervals = self.fetch(since, since + TimeDelta::days(i64::from(days_ahead))).await?;
        let summaries = summarize_daily(&intervals)?;
        info!(n_days = summaries.len(), "summarized");
        Ok(summaries)
    }

    /// Find the best window of `window_hours` within `horizon_days` from now.
    #[instrument(skip_all, fields(window_hours = window_hours, horizon_days = horizon_days))]
    pub async fn compute_optimal_window(
        &self,
        now: DateTime<Utc>,
        window_hours: i64,
        horizon_days: u16,
    ) -> Result<ChargingWindow, EngineError> {
        if window_hours <= 0 {
            return Err(EngineError::InvalidWindowLength(format!(
                "{window_hours} hours is not positive",
            )));
        }
        let duration = TimeDelta::try_hours(window_hours).ok_or_else(|| {
            EngineError::InvalidWindowLength(format!("{window_hours} hours is out of range"))
        })?;
        let intervals = self.fetch(now, now + TimeDelta::days(i64::from(horizon_days))).await?;
        let window =
            WindowSearch::builder().intervals(&intervals).duration(duration).build().find()?;
        info!(
            start = %window.start,
            end = %window.end,
            average_clean_percent = window.average_clean_percent,
            "found",
        );
        Ok(window)
    }

    async fn fetch(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Interval>, EngineError> {
        if from >= to {
            warn!(%from, %to, "empty range");
            return Err(EngineError::NoDataReturned);
        }
        let intervals = self.fetcher.fetch_intervals(from, to).await?;
        if intervals.is_empty() {
            warn!(%from, %to, "no data returned");
            return Err(EngineError::NoDataReturned);
        }
        Ok(intervals)
    }
}
