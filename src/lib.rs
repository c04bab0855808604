//! `salescast` library crate.
//!
//! The binary (`salescast`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the CLI report and the terminal dashboard share one pipeline

pub mod app;
pub mod cli;
pub mod dashboard;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod tui;
