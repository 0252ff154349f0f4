pub mod carbon_intensity;
pub mod client;
pub mod fetcher;

pub use self::{carbon_intensity::Api as CarbonIntensity, fetcher::IntervalFetcher};
