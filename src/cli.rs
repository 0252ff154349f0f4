use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Url;

use crate::{api::CarbonIntensity, engine::Engine, prelude::*};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[clap(flatten)]
    pub api: ApiArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the average generation mix for each of the upcoming days.
    #[clap(name = "summary")]
    Summary(SummaryArgs),

    /// Find the time window with the highest clean-energy share.
    #[clap(name = "window")]
    Window(WindowArgs),

    /// Serve the summaries and charging windows over HTTP.
    #[clap(name = "serve")]
    Serve(Box<ServeArgs>),
}

#[derive(Parser)]
pub struct ApiArgs {
    /// Carbon Intensity API base URL.
    #[clap(
        long = "api-base-url",
        env = "CARBON_INTENSITY_API_URL",
        default_value = "https://api.carbonintensity.org.uk"
    )]
    pub base_url: Url,

    /// Upstream request timeout in seconds.
    #[clap(long = "request-timeout-secs", env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub timeout_secs: u64,
}

impl ApiArgs {
    pub fn try_new_engine(&self) -> Result<Engine> {
        let api = CarbonIntensity::try_new(self.base_url.clone(), self.timeout())?;
        Ok(Engine::new(api))
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Copy, Clone, Parser)]
pub struct SummaryArgs {
    /// Number of days to summarize, starting today.
    #[clap(
        long,
        env = "DAYS_AHEAD",
        default_value = "3",
        value_parser = clap::value_parser!(u16).range(1..),
    )]
    pub days_ahead: u16,
}

#[derive(Copy, Clone, Parser)]
pub struct HorizonArgs {
    /// Number of days ahead to search for a charging window in.
    #[clap(
        long,
        env = "HORIZON_DAYS",
        default_value = "2",
        value_parser = clap::value_parser!(u16).range(1..),
    )]
    pub horizon_days: u16,
}

#[derive(Parser)]
pub struct WindowArgs {
    /// Charging duration in hours.
    #[clap(long, value_parser = clap::value_parser!(i64).range(1..))]
    pub window_hours: i64,

    #[clap(flatten)]
    pub horizon: HorizonArgs,
}

#[derive(Parser)]
pub struct ServeArgs {
    #[clap(long, default_value = "0.0.0.0:8080", env = "BIND_ADDRESS")]
    pub bind_address: String,

    #[clap(flatten)]
    pub summary: SummaryArgs,

    #[clap(flatten)]
    pub horizon: HorizonArgs,
}
