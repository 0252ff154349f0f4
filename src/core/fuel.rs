use serde::{Deserialize, Serialize};

/// Fuel types counted as clean, low-carbon generation.
pub const CLEAN_FUELS: [&str; 5] = ["biomass", "nuclear", "hydro", "wind", "solar"];

#[must_use]
pub fn is_clean(fuel: &str) -> bool {
    CLEAN_FUELS.contains(&fuel)
}

/// Share of a single fuel type in the generation mix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuelShare {
    pub fuel: String,

    /// Percentage of the total generation, `0..=100`.
    #[serde(rename = "perc")]
    pub percentage: f64,
}

#[cfg(test)]
impl FuelShare {
    pub fn new(fuel: impl Into<String>, percentage: f64) -> Self {
        Self { fuel: fuel.into(), percentage }
    }
}

/// Sum up the percentages of the clean fuel types, ignoring everything else.
#[must_use]
pub fn clean_percentage(mix: &[FuelShare]) -> f64 {
    mix.iter().filter(|share| is_clean(&share.fuel)).map(|share| share.percentage).sum()
}
