//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - request configuration enums (`ForecastScope`, `ForecastSource`)
//! - typed sales rows (`SalesRecord`) and prediction points (`Prediction`)
//! - the forecasting service's wire types (`TrainResult`, residuals, etc.)

pub mod types;

pub use types::*;
