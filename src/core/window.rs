use bon::Builder;
use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    core::{error::EngineError, interval::Interval},
    prelude::*,
};

/// The contiguous run of intervals with the highest average clean-energy share.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargingWindow {
    /// Start of the first interval.
    #[serde(rename = "startingDateTime")]
    pub start: DateTime<Utc>,

    /// End of the last interval.
    #[serde(rename = "endingDateTime")]
    pub end: DateTime<Utc>,

    #[serde(rename = "averageCleanEnergyPercent")]
    pub average_clean_percent: f64,
}

#[derive(Builder)]
pub struct WindowSearch<'a> {
    /// Ordered contiguous intervals of the same length.
    intervals: &'a [Interval],

    /// Requested total duration of the window.
    duration: TimeDelta,
}

impl WindowSearch<'_> {
    /// Slide the window over the intervals and keep the best one.
    ///
    /// The earliest window wins when several share the maximum average.
    #[instrument(skip_all, fields(n_intervals = self.intervals.len(), duration = %self.duration))]
    pub fn find(self) -> Result<ChargingWindow, EngineError> {
        if self.duration <= TimeDelta::zero() {
            return Err(EngineError::non_positive_window(self.duration));
        }
        let Some(first) = self.intervals.first() else {
            return Err(EngineError::NoDataReturned);
        };
        let window_size = window_size(self.duration, first.duration())?;
        if window_size > self.intervals.len() {
            return Err(EngineError::WindowTooLarge {
                requested: window_size,
                available: self.intervals.len(),
            });
        }

        let clean_percentages = self.intervals.iter().map(Interval::clean_percentage).collect_vec();
        let average_at = |start_index: usize| {
            #[allow(clippy::cast_precision_loss)]
            let average = clean_percentages[start_index..start_index + window_size]
                .iter()
                .sum::<f64>()
                / window_size as f64;
            average
        };
        let noise = running_sum_noise(&clean_percentages, window_size);

        let mut running_sum: f64 = clean_percentages[..window_size].iter().sum();
        let mut best = Best { start_index: 0, running_sum, average: Some(average_at(0)) };
        for start_index in 1..=(clean_percentages.len() - window_size) {
            running_sum += clean_percentages[start_index + window_size - 1]
                - clean_percentages[start_index - 1];
            if running_sum > best.running_sum + noise {
                best = Best { start_index, running_sum, average: None };
            } else if running_sum >= best.running_sum - noise {
                // Too close to call from the running sums, compare the exact averages:
                let leader = best.start_index;
                let best_average = *best.average.get_or_insert_with(|| average_at(leader));
                let average = average_at(start_index);
                if average > best_average {
                    best = Best { start_index, running_sum, average: Some(average) };
                }
            }
        }

        let start_index = best.start_index;
        let end_index = start_index + window_size - 1;
        let average_clean_percent = best.average.unwrap_or_else(|| average_at(start_index));
        debug!(start_index, window_size, average_clean_percent, "found the best window");

        Ok(ChargingWindow {
            start: self.intervals[start_index].start,
            end: self.intervals[end_index].end,
            average_clean_percent,
        })
    }
}

/// Current leader of the sliding-window search.
struct Best {
    start_index: usize,

    /// Running sum at the time the window took the lead.
    running_sum: f64,

    /// Exact average over the window's own slice, once computed.
    average: Option<f64>,
}

/// Upper bound of the rounding error the running sum may accumulate over the whole slide.
///
/// Sums further apart than this are ordered the same way as the exact per-window averages.
#[allow(clippy::cast_precision_loss)]
fn running_sum_noise(clean_percentages: &[f64], window_size: usize) -> f64 {
    let max_magnitude =
        clean_percentages.iter().map(|percentage| percentage.abs()).fold(0.0, f64::max);
    let n_operations = (window_size + 2 * clean_percentages.len()) as f64;
    4.0 * n_operations * window_size as f64 * max_magnitude * f64::EPSILON
}

/// Convert the requested duration into a number of intervals.
fn window_size(duration: TimeDelta, interval_length: TimeDelta) -> Result<usize, EngineError> {
    let interval_seconds = interval_length.num_seconds();
    if interval_seconds <= 0 {
        return Err(EngineError::UpstreamMalformed(format!(
            "non-positive interval length of {interval_seconds} seconds",
        )));
    }
    let requested_seconds = duration.num_seconds();
    if requested_seconds % interval_seconds != 0 {
        return Err(EngineError::InvalidWindowLength(format!(
            "{requested_seconds} seconds is not a multiple of the {interval_seconds}-second interval",
        )));
    }
    match usize::try_from(requested_seconds / interval_seconds) {
        Ok(0) | Err(_) => Err(EngineError::non_positive_window(duration)),
        Ok(window_size) => Ok(window_size),
    }
}
