//! External data sources.

pub mod service;

pub use service::{ForecastClient, ServiceConfig};
