use chrono::TimeDelta;

/// Everything that can go wrong while aggregating the generation mix.
///
/// None of these are retried here: the caller decides what to do with them.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("the upstream returned no generation intervals for the requested range")]
    NoDataReturned,

    #[error("no generation intervals fall on {0}")]
    EmptyIntervalSet(chrono::NaiveDate),

    #[error(
        "the requested window of {requested} intervals exceeds the {available} available intervals"
    )]
    WindowTooLarge { requested: usize, available: usize },

    #[error("invalid window length: {0}")]
    InvalidWindowLength(String),

    #[error("the generation mix API is unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("the generation mix API returned malformed data: {0}")]
    UpstreamMalformed(String),
}

impl EngineError {
    pub fn non_positive_window(duration: TimeDelta) -> Self {
        Self::InvalidWindowLength(format!("{} minutes is not positive", duration.num_minutes()))
    }

    /// Short machine-friendly name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoDataReturned => "NoDataReturned",
            Self::EmptyIntervalSet(_) => "EmptyIntervalSet",
            Self::WindowTooLarge { .. } => "WindowTooLarge",
            Self::InvalidWindowLength(_) => "InvalidWindowLength",
            Self::UpstreamUnavailable(_) => "UpstreamUnavailable",
            Self::UpstreamMalformed(_) => "UpstreamMalformed",
        }
    }
}
