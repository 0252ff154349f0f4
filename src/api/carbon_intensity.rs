//! [Carbon Intensity API](https://carbon-intensity.github.io/api-definitions/) client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use itertools::Itertools;
use reqwest::{Client, Url};
use serde::{Deserialize, Deserializer, de};

use crate::{
    api::{client, fetcher::IntervalFetcher},
    core::{EngineError, FuelShare, Interval},
    prelude::*,
};

/// Minute-precision UTC timestamps, as the API uses them.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

pub struct Api {
    client: Client,
    base_url: Url,
}

impl Api {
    pub fn try_new(base_url: Url, timeout: Duration) -> Result<Self> {
        Ok(Self { client: client::try_new(timeout)?, base_url })
    }

    fn generation_url(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> String {
        format!(
            "{}/generation/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            from.format(TIMESTAMP_FORMAT),
            to.format(TIMESTAMP_FORMAT),
        )
    }
}

#[async_trait]
impl IntervalFetcher for Api {
    #[instrument(skip_all, fields(from = %from, to = %to))]
    async fn fetch_intervals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Interval>, EngineError> {
        info!("fetching…");
        let body = self
            .client
            .get(self.generation_url(from, to))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| EngineError::UpstreamUnavailable(error.to_string()))?
            .bytes()
            .await
            .map_err(|error| EngineError::UpstreamUnavailable(error.to_string()))?;
        let intervals = serde_json::from_slice::<GenerationResponse>(&body)
            .map_err(|error| EngineError::UpstreamMalformed(error.to_string()))?
            .data
            .into_iter()
            .map(Interval::from)
            .collect_vec();
        validate(&intervals)?;
        info!(n_intervals = intervals.len(), "fetched");
        Ok(intervals)
    }
}

/// Reject the data the aggregation would silently misinterpret.
///
/// The intervals must be contiguous and of the same length, since the window search
/// counts them off the first interval's length.
fn validate(intervals: &[Interval]) -> Result<(), EngineError> {
    for interval in intervals {
        if interval.end <= interval.start {
            return Err(EngineError::UpstreamMalformed(format!(
                "interval {interval:?} does not end after it starts",
            )));
        }
        if let Some(share) =
            interval.mix.iter().find(|share| !share.percentage.is_finite() || share.percentage < 0.0)
        {
            return Err(EngineError::UpstreamMalformed(format!(
                "invalid `{}` percentage {} in {interval:?}",
                share.fuel, share.percentage,
            )));
        }
        if !interval.mix.iter().map(|share| share.fuel.as_str()).all_unique() {
            return Err(EngineError::UpstreamMalformed(format!(
                "duplicate fuel types in {interval:?}",
            )));
        }
    }
    for (previous, next) in intervals.iter().tuple_windows() {
        if previous.end != next.start {
            return Err(EngineError::UpstreamMalformed(format!(
                "interval {next:?} does not immediately follow {previous:?}",
            )));
        }
        if previous.duration() != next.duration() {
            return Err(EngineError::UpstreamMalformed(format!(
                "interval {next:?} differs in length from {previous:?}",
            )));
        }
    }
    Ok(())
}

#[derive(Deserialize)]
struct GenerationResponse {
    data: Vec<GenerationInterval>,
}

#[derive(Deserialize)]
struct GenerationInterval {
    #[serde(deserialize_with = "deserialize_timestamp")]
    from: DateTime<Utc>,

    #[serde(deserialize_with = "deserialize_timestamp")]
    to: DateTime<Utc>,

    #[serde(rename = "generationmix")]
    mix: Vec<FuelShare>,
}

impl From<GenerationInterval> for Interval {
    fn from(interval: GenerationInterval) -> Self {
        Self::new(interval.from, interval.to, interval.mix)
    }
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let timestamp = String::deserialize(deserializer)?;
    parse_timestamp(&timestamp).ok_or_else(|| {
        de::Error::invalid_value(de::Unexpected::Str(&timestamp), &"an ISO 8601 UTC timestamp")
    })
}

fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    const RESPONSE: &str = r#"{
        "data": [
            {
                "from": "2025-12-14T12:00Z",
                "to": "2025-12-14T12:30Z",
                "generationmix": [
                    {"fuel": "biomass", "perc": 7.2},
                    {"fuel": "coal", "perc": 0},
                    {"fuel": "imports", "perc": 11.4},
                    {"fuel": "gas", "perc": 31.9},
                    {"fuel": "nuclear", "perc": 12.5},
                    {"fuel": "other", "perc": 0.3},
                    {"fuel": "hydro", "perc": 1.6},
                    {"fuel": "solar", "perc": 4.1},
                    {"fuel": "wind", "perc": 31}
                ]
            },
            {
                "from": "2025-12-14T12:30:00+00:00",
                "to": "2025-12-14T13:00:00Z",
                "generationmix": [
                    {"fuel": "gas", "perc": 60},
                    {"fuel": "wind", "perc": 40}
                ]
            }
        ]
    }"#;

    /// Half-hour interval starting the given number of minutes after noon.
    fn interval(start_minute: i64, mix: Vec<FuelShare>) -> Interval {
        let start = Utc.with_ymd_and_hms(2025, 12, 14, 12, 0, 0).unwrap()
            + TimeDelta::minutes(start_minute);
        Interval::new(start, start + TimeDelta::minutes(30), mix)
    }

    #[test]
    fn test_deserialize_response() -> Result {
        let intervals = serde_json::from_str::<GenerationResponse>(RESPONSE)?
            .data
            .into_iter()
            .map(Interval::from)
            .collect_vec();
        validate(&intervals)?;
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].start, Utc.with_ymd_and_hms(2025, 12, 14, 12, 0, 0).unwrap());
        assert_eq!(intervals[0].duration(), TimeDelta::minutes(30));
        assert_eq!(intervals[0].mix.len(), 9);
        assert_abs_diff_eq!(intervals[0].clean_percentage(), 56.4, epsilon = 1e-9);
        assert_eq!(intervals[1].end, Utc.with_ymd_and_hms(2025, 12, 14, 13, 0, 0).unwrap());
        assert_abs_diff_eq!(intervals[1].clean_percentage(), 40.0);
        Ok(())
    }

    #[test]
    fn test_deserialize_invalid_timestamp() {
        let response = r#"{
            "data": [{"from": "yesterday", "to": "2025-12-14T12:30Z", "generationmix": []}]
        }"#;
        assert!(serde_json::from_str::<GenerationResponse>(response).is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2025, 12, 14, 23, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-12-14T23:30Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-12-14T23:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-12-15T00:30:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-12-14"), None);
    }

    #[test]
    fn test_generation_url() -> Result {
        let api = Api::try_new(
            Url::parse("https://api.carbonintensity.org.uk/")?,
            Duration::from_secs(1),
        )?;
        let url = api.generation_url(
            Utc.with_ymd_and_hms(2025, 12, 14, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 17, 0, 0, 0).unwrap(),
        );
        assert_eq!(
            url,
            "https://api.carbonintensity.org.uk/generation/2025-12-14T00:00Z/2025-12-17T00:00Z",
        );
        Ok(())
    }

    #[test]
    fn test_validate_negative_percentage() {
        let intervals = [interval(0, vec![FuelShare::new("wind", -1.0)])];
        assert!(matches!(validate(&intervals), Err(EngineError::UpstreamMalformed(_))));
    }

    #[test]
    fn test_validate_duplicate_fuel() {
        let intervals =
            [interval(0, vec![FuelShare::new("wind", 10.0), FuelShare::new("wind", 20.0)])];
        assert!(matches!(validate(&intervals), Err(EngineError::UpstreamMalformed(_))));
    }

    #[test]
    fn test_validate_unordered() {
        let intervals = [interval(30, Vec::new()), interval(0, Vec::new())];
        assert!(matches!(validate(&intervals), Err(EngineError::UpstreamMalformed(_))));
    }

    #[test]
    fn test_validate_gap() {
        let intervals =
            [interval(0, Vec::new()), interval(30, Vec::new()), interval(90, Vec::new())];
        assert!(matches!(validate(&intervals), Err(EngineError::UpstreamMalformed(_))));
    }

    #[test]
    fn test_validate_mixed_lengths() {
        let start = Utc.with_ymd_and_hms(2025, 12, 14, 12, 0, 0).unwrap();
        let intervals = [
            Interval::new(start, start + TimeDelta::minutes(30), Vec::new()),
            Interval::new(
                start + TimeDelta::minutes(30),
                start + TimeDelta::minutes(90),
                Vec::new(),
            ),
        ];
        assert!(matches!(validate(&intervals), Err(EngineError::UpstreamMalformed(_))));
    }

    #[test]
    fn test_validate_empty_interval() {
        let start = Utc.with_ymd_and_hms(2025, 12, 14, 12, 0, 0).unwrap();
        let intervals = [Interval::new(start, start, Vec::new())];
        assert!(matches!(validate(&intervals), Err(EngineError::UpstreamMalformed(_))));
    }

    #[test]
    fn test_validate_ok() -> Result<(), EngineError> {
        let intervals = [interval(0, Vec::new()), interval(30, Vec::new())];
        validate(&intervals)
    }

    #[tokio::test]
    #[ignore = "makes the API request"]
    async fn test_fetch_intervals_ok() -> Result {
        let api = Api::try_new(
            Url::parse("https://api.carbonintensity.org.uk")?,
            Duration::from_secs(10),
        )?;
        let from = Utc::now() - TimeDelta::days(1);
        let intervals = api.fetch_intervals(from, from + TimeDelta::hours(6)).await?;
        assert!(!intervals.is_empty());
        assert!(intervals.iter().is_sorted_by_key(|interval| interval.start));
        Ok(())
    }
}
