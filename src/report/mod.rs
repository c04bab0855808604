//! Reporting utilities: formatted terminal output for dashboards.

pub mod format;

pub use format::*;
