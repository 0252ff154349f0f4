use std::fmt::{Debug, Formatter};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::core::fuel::{FuelShare, clean_percentage};

/// Generation mix reported for a fixed time slice.
#[derive(Clone, PartialEq)]
#[must_use]
pub struct Interval {
    /// Inclusive.
    pub start: DateTime<Utc>,

    /// Exclusive.
    pub end: DateTime<Utc>,

    pub mix: Vec<FuelShare>,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?} ({} fuels)", self.start, self.end, self.mix.len())
    }
}

impl Interval {
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>, mix: Vec<FuelShare>) -> Self {
        Self { start, end, mix }
    }

    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// UTC calendar date the interval belongs to.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    #[must_use]
    pub fn clean_percentage(&self) -> f64 {
        clean_percentage(&self.mix)
    }
}
