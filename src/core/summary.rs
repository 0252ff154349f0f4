use std::collections::BTreeMap;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::core::{error::EngineError, interval::Interval};

/// Average generation mix over one UTC calendar date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,

    #[serde(rename = "cleanEnergyPercent")]
    pub clean_energy_percent: f64,

    /// Average percentage per fuel type, as mentioned by any of the day's intervals.
    #[serde(rename = "fuelMix")]
    pub fuel_mix: BTreeMap<String, f64>,
}

impl DailySummary {
    /// Average the intervals of a single date.
    ///
    /// Every sum is divided by the total number of intervals on that date,
    /// so a fuel type missing from an interval contributes zero to it.
    pub fn try_from_intervals<'a>(
        date: NaiveDate,
        intervals: impl IntoIterator<Item = &'a Interval>,
    ) -> Result<Self, EngineError> {
        let mut n_intervals = 0_usize;
        let mut clean_percentage_sum = 0.0;
        let mut fuel_sums = BTreeMap::<String, f64>::new();

        for interval in intervals {
            n_intervals += 1;
            clean_percentage_sum += interval.clean_percentage();
            for share in &interval.mix {
                match fuel_sums.get_mut(&share.fuel) {
                    Some(sum) => *sum += share.percentage,
                    None => {
                        fuel_sums.insert(share.fuel.clone(), share.percentage);
                    }
                }
            }
        }

        if n_intervals == 0 {
            return Err(EngineError::EmptyIntervalSet(date));
        }

        #[allow(clippy::cast_precision_loss)]
        let n_intervals = n_intervals as f64;
        for sum in fuel_sums.values_mut() {
            *sum /= n_intervals;
        }
        Ok(Self {
            date,
            clean_energy_percent: clean_percentage_sum / n_intervals,
            fuel_mix: fuel_sums,
        })
    }

    /// Fuel types ordered by their average share, largest first.
    pub fn fuels_by_share(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fuel_mix
            .iter()
            .map(|(fuel, percentage)| (fuel.as_str(), *percentage))
            .sorted_by(|(_, lhs), (_, rhs)| rhs.total_cmp(lhs))
    }
}

/// Group the intervals by the UTC date of their start and summarize each date.
///
/// The summaries are ordered by date, ascending.
pub fn summarize_daily(intervals: &[Interval]) -> Result<Vec<DailySummary>, EngineError> {
    if intervals.is_empty() {
        return Err(EngineError::NoDataReturned);
    }
    intervals
        .iter()
        .into_group_map_by(|interval| interval.date())
        .into_iter()
        .sorted_unstable_by_key(|(date, _)| *date)
        .map(|(date, group)| DailySummary::try_from_intervals(date, group))
        .collect()
}
