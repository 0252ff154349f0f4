pub mod error;
pub mod fuel;
pub mod interval;
pub mod summary;
pub mod window;

pub use self::{
    error::EngineError,
    fuel::FuelShare,
    interval::Interval,
    summary::{DailySummary, summarize_daily},
    window::{ChargingWindow, WindowSearch},
};
