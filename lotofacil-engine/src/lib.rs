pub mod backtest;
pub mod combinatorics;
pub mod config;
pub mod error;
pub mod features;
pub mod filters;
pub mod generator;
pub mod persistence;
pub mod pools;
pub mod positional;
pub mod reducer;
pub mod sampler;
pub mod scoring;
pub mod stats;

pub use error::{EngineError, Result};
