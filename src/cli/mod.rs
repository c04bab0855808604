//! Command-line parsing for the sales forecast dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the forecasting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_DEPT_LIMIT, DEFAULT_HORIZON, DEFAULT_STORE_LIMIT, ForecastScope, ForecastSource};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "salescast", version, about = "Weekly retail sales forecast dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a local mock forecast and print the dashboard.
    Predict(PredictArgs),
    /// Upload a sales file to the forecasting service and print the result.
    Train(TrainArgs),
    /// Print a previously saved dashboard.
    Show(ShowArgs),
    /// Launch the interactive terminal dashboard.
    Dash(DashArgs),
}

/// Terminal plot options shared by the printing commands.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Render an ASCII chart of actual vs predicted sales.
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the ASCII chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

impl PlotArgs {
    pub fn enabled(&self) -> bool {
        self.plot && !self.no_plot
    }
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Sales CSV (Store, Dept, Date, Weekly_Sales, IsHoliday).
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: PathBuf,

    /// Random seed for the mock generator.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of stores in the store breakdown.
    #[arg(long, default_value_t = DEFAULT_STORE_LIMIT)]
    pub stores: usize,

    /// Number of departments in the department breakdown.
    #[arg(long, default_value_t = DEFAULT_DEPT_LIMIT)]
    pub depts: usize,

    #[command(flatten)]
    pub plot: PlotArgs,

    /// Export prediction rows to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Save the dashboard to JSON for `salescast show`.
    #[arg(long, value_name = "JSON")]
    pub save: Option<PathBuf>,
}

/// Connection and scope options for the forecasting service.
#[derive(Debug, Args, Clone)]
pub struct ServiceArgs {
    /// Aggregation level to forecast.
    #[arg(long, value_enum, default_value_t = ForecastScope::Overall)]
    pub scope: ForecastScope,

    /// Store id (required for `--scope store`).
    #[arg(long)]
    pub store_id: Option<u32>,

    /// Department id (required for `--scope department`).
    #[arg(long)]
    pub dept_id: Option<u32>,

    /// Weeks to forecast ahead.
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub horizon: usize,

    /// Forecasting service base URL (overrides SALESCAST_API_URL).
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Sales CSV to upload.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: PathBuf,

    #[command(flatten)]
    pub service: ServiceArgs,

    #[command(flatten)]
    pub plot: PlotArgs,

    /// Save the dashboard to JSON for `salescast show`.
    #[arg(long, value_name = "JSON")]
    pub save: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Dashboard JSON written by `--save`.
    #[arg(long, value_name = "JSON")]
    pub dashboard: PathBuf,

    #[command(flatten)]
    pub plot: PlotArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DashArgs {
    /// Sales CSV; a picker is shown when omitted.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Where forecasts come from when the dashboard opens.
    #[arg(long, value_enum, default_value_t = ForecastSource::Mock)]
    pub source: ForecastSource,

    /// Random seed for the mock generator.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub service: ServiceArgs,
}
