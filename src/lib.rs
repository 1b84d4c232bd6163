//! Resume screener library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod ml;
pub mod pipeline;
pub mod processing;

pub use config::Config;
pub use error::{Result, ScreenerError};
pub use pipeline::{ScreeningPipeline, ScreeningRecord, ScreeningRequest};
